use strum::IntoEnumIterator;
use crate::utils::utils_errors::DiffcoError;
use crate::utils::utils_traits::ToAndFromRonString;

pub struct EnumUtils;
impl EnumUtils {
    pub fn get_all_variants_of_enum<T: IntoEnumIterator>() -> Vec<T> {
        let out: Vec<T> = T::iter().collect();
        out
    }
    pub fn convert_all_variants_of_enum_into_ron_strings<T: IntoEnumIterator + ToAndFromRonString>() -> Result<Vec<String>, DiffcoError> {
        let mut out = vec![];

        let variants = Self::get_all_variants_of_enum::<T>();
        for v in &variants { out.push(v.convert_to_ron_string()?); }

        Ok(out)
    }
    /// Names of every variant as given by `Display`, e.g. for listing choices in a usage message.
    pub fn get_all_variant_names<T: IntoEnumIterator + ToString>() -> Vec<String> {
        T::iter().map(|v| v.to_string()).collect()
    }
}
