use std::path::Path;
use serde::de::DeserializeOwned;
use serde::{Serialize};
use crate::utils::utils_errors::DiffcoError;
use crate::utils::utils_files::FileUtils;

/// Objects that are persisted as json files (datasets, trained proxies).
pub trait SaveAndLoadable {
    type SaveType: Serialize + DeserializeOwned;

    fn get_save_serialization_object(&self) -> Self::SaveType;
    fn get_serialization_string(&self) -> Result<String, DiffcoError> {
        return serde_json::to_string(&self.get_save_serialization_object())
            .map_err(|e| DiffcoError::new_generic_error_str(&e.to_string(), file!(), line!()));
    }
    fn save_to_path(&self, path: &Path) -> Result<(), DiffcoError> {
        FileUtils::save_object_to_file_as_json(&self.get_save_serialization_object(), path)
    }
    fn load_from_path(path: &Path) -> Result<Self, DiffcoError> where Self: Sized {
        let s = FileUtils::read_file_contents_to_string(path)?;
        return Self::load_from_json_string(&s);
    }
    fn load_from_json_string(json_str: &str) -> Result<Self, DiffcoError> where Self: Sized;
}

pub trait ToAndFromRonString: Serialize + DeserializeOwned {
    fn convert_to_ron_string(&self) -> Result<String, DiffcoError> {
        return ron::to_string(self).map_err(|e| DiffcoError::new_generic_error_str(&e.to_string(), file!(), line!()));
    }
    fn load_from_ron_string(ron_string: &str) -> Result<Self, DiffcoError> where Self: Sized {
        let load: Result<Self, _> = ron::from_str(ron_string);
        return if let Ok(load) = load { Ok(load) } else {
            Err(DiffcoError::new_generic_error_str(&format!("Could not load ron string {:?} into correct type.", ron_string), file!(), line!()))
        }
    }
}
impl <T> ToAndFromRonString for T where T: Serialize + DeserializeOwned {  }

pub trait ToAndFromJsonString: Serialize + DeserializeOwned {
    fn convert_to_json_string(&self) -> Result<String, DiffcoError> {
        return serde_json::to_string(self).map_err(|e| DiffcoError::new_generic_error_str(&e.to_string(), file!(), line!()));
    }
    fn load_from_json_string(json_string: &str) -> Result<Self, DiffcoError> where Self: Sized {
        FileUtils::load_object_from_json_string(json_string)
    }
}
impl <T> ToAndFromJsonString for T where T: Serialize + DeserializeOwned {  }

pub trait ToAndFromTomlString: Serialize + DeserializeOwned {
    fn convert_to_toml_string(&self) -> Result<String, DiffcoError> {
        return toml::to_string(self).map_err(|e| DiffcoError::new_generic_error_str(&e.to_string(), file!(), line!()));
    }
    fn load_from_toml_string(toml_string: &str) -> Result<Self, DiffcoError> where Self: Sized {
        let load: Result<Self, _> = toml::from_str(toml_string);
        return match load {
            Ok(load) => { Ok(load) }
            Err(e) => { Err(DiffcoError::new_generic_error_str(&format!("Could not load toml string into correct type: {}", e), file!(), line!())) }
        }
    }
}
impl <T> ToAndFromTomlString for T where T: Serialize + DeserializeOwned {  }

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Params {
        gamma: f64,
        max_iterations: usize,
        name: String
    }

    #[test]
    fn ron_and_toml_strings_load_back() {
        let p = Params { gamma: 10.0, max_iterations: 500, name: "3circle".to_string() };

        let ron_string = p.convert_to_ron_string().unwrap();
        assert_eq!(Params::load_from_ron_string(&ron_string).unwrap(), p);

        let toml_string = p.convert_to_toml_string().unwrap();
        assert_eq!(Params::load_from_toml_string(&toml_string).unwrap(), p);
    }

    #[test]
    fn bad_ron_string_is_an_error() {
        assert!(Params::load_from_ron_string("(gamma: oops)").is_err());
    }
}
