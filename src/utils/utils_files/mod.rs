use std::{env, fs};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use serde::Serialize;
use serde::de::DeserializeOwned;
use crate::utils::utils_errors::DiffcoError;
use crate::utils::utils_traits::ToAndFromTomlString;

/// Convenience struct that holds many class functions related to file utils.
pub struct FileUtils;
impl FileUtils {
    /// Returns file path to the location from which the program is being executed.
    pub fn get_path_to_src() -> Result<PathBuf, DiffcoError> {
        return env::current_dir().map_err(|e| DiffcoError::new_generic_error_str(&e.to_string(), file!(), line!()));
    }
    /// Reads contents of file and outputs it to a string.
    pub fn read_file_contents_to_string(p: &Path) -> Result<String, DiffcoError> {
        let mut file_res = File::open(p);
        return match &mut file_res {
            Ok(f) => {
                let mut contents = String::new();
                f.read_to_string(&mut contents).map_err(|e| DiffcoError::new_generic_error_str(&e.to_string(), file!(), line!()))?;
                Ok(contents)
            }
            Err(e) => {
                Err(DiffcoError::new_generic_error_str(&format!("could not open {:?}: {}", p, e), file!(), line!()))
            }
        }
    }
    /// Returns file extension of path as string.
    pub fn get_file_extension_string(p: &Path) -> Option<String> {
        return p.extension().and_then(|e| e.to_str()).map(|e| e.to_string());
    }
    /// Saves given object to a file as a JSON string.  The object must be serializable using serde json.
    /// Any existing file at the path is replaced.
    pub fn save_object_to_file_as_json<T: Serialize>(object: &T, p: &Path) -> Result<(), DiffcoError> {
        Self::create_parent_dirs(p)?;

        let file_res = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(p);
        return match file_res {
            Ok(f) => {
                let mut writer = BufWriter::new(f);
                serde_json::to_writer(&mut writer, object).map_err(|e| DiffcoError::new_generic_error_str(&e.to_string(), file!(), line!()))?;
                writer.flush().map_err(|e| DiffcoError::new_generic_error_str(&e.to_string(), file!(), line!()))?;
                Ok(())
            }
            Err(e) => {
                Err(DiffcoError::new_generic_error_str(&format!("could not write {:?}: {}", p, e), file!(), line!()))
            }
        }
    }
    /// Reads object that was serialized by serde JSON from a file.
    pub fn load_object_from_json_file<T: DeserializeOwned>(p: &Path) -> Result<T, DiffcoError> {
        let contents = Self::read_file_contents_to_string(p)?;
        return Self::load_object_from_json_string(&contents);
    }
    pub fn load_object_from_json_string<T: DeserializeOwned>(json_str: &str) -> Result<T, DiffcoError> {
        let o_res = serde_json::from_str(json_str);
        return match o_res {
            Ok(o) => { Ok(o) }
            Err(e) => {
                Err(DiffcoError::new_generic_error_str(&format!("load_object_from_json_string() failed.  The given json_string is incompatible with the requested type: {}", e), file!(), line!()))
            }
        }
    }
    /// Loads a serde object from a `.toml`, `.ron`, or `.json` file, chosen by extension.
    pub fn load_object_from_config_file<T: DeserializeOwned + Serialize>(p: &Path) -> Result<T, DiffcoError> {
        let contents = Self::read_file_contents_to_string(p)?;
        let extension = Self::get_file_extension_string(p).unwrap_or_default();
        return match extension.as_str() {
            "toml" => { T::load_from_toml_string(&contents) }
            "ron" => {
                ron::from_str(&contents).map_err(|e| DiffcoError::new_generic_error_str(&format!("could not parse ron file {:?}: {}", p, e), file!(), line!()))
            }
            "json" => { Self::load_object_from_json_string(&contents) }
            _ => {
                Err(DiffcoError::new_unsupported_operation_error("load_object_from_config_file", &format!("unsupported config file extension {:?}.", extension), file!(), line!()))
            }
        }
    }
    fn create_parent_dirs(p: &Path) -> Result<(), DiffcoError> {
        let parent_option = p.parent();
        match parent_option {
            None => { return Err(DiffcoError::new_generic_error_str("Could not get parent of path in save_object_to_file_as_json.", file!(), line!())) }
            Some(parent) => {
                if parent.as_os_str().is_empty() { return Ok(()); }
                fs::create_dir_all(parent).map_err(|e| DiffcoError::new_generic_error_str(&e.to_string(), file!(), line!()))?;
            }
        }
        Ok(())
    }
}

/// Locations of persisted experiment data, relative to a data root directory.
#[derive(Clone, Debug)]
pub enum DataDirLocation {
    Datasets,
    Dataset { key: String },
    Proxies,
    Proxy { key: String }
}
impl DataDirLocation {
    pub fn get_path_wrt_data_dir(&self) -> PathBuf {
        return match self {
            DataDirLocation::Datasets => {
                Path::new("landscape").to_path_buf()
            }
            DataDirLocation::Dataset { key } => {
                let mut out_path = Self::Datasets.get_path_wrt_data_dir();
                out_path = out_path.join(format!("{}.json", key));
                out_path
            }
            DataDirLocation::Proxies => {
                Path::new("proxies").to_path_buf()
            }
            DataDirLocation::Proxy { key } => {
                let mut out_path = Self::Proxies.get_path_wrt_data_dir();
                out_path = out_path.join(format!("{}.json", key));
                out_path
            }
        }
    }
}

pub struct DataDirUtils;
impl DataDirUtils {
    /// Default data root: `data/` under the directory the program is run from.
    pub fn get_default_data_dir() -> Result<PathBuf, DiffcoError> {
        let mut p = FileUtils::get_path_to_src()?;
        p.push("data");
        Ok(p)
    }
    pub fn get_path_to_data_dir_location(data_dir: &Path, l: DataDirLocation) -> PathBuf {
        return data_dir.join(l.get_path_wrt_data_dir());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        values: Vec<f64>
    }

    #[test]
    fn overwriting_a_longer_file_leaves_no_trailing_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("nested").join("blob.json");

        FileUtils::save_object_to_file_as_json(&Blob { values: vec![1.0; 100] }, &p).unwrap();
        FileUtils::save_object_to_file_as_json(&Blob { values: vec![2.5] }, &p).unwrap();

        let loaded: Blob = FileUtils::load_object_from_json_file(&p).unwrap();
        assert_eq!(loaded, Blob { values: vec![2.5] });
    }

    #[test]
    fn config_file_is_parsed_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("blob.toml");
        fs::write(&p, "values = [0.5, 1.5]\n").unwrap();
        let loaded: Blob = FileUtils::load_object_from_config_file(&p).unwrap();
        assert_eq!(loaded.values, vec![0.5, 1.5]);

        let bad = dir.path().join("blob.yaml");
        fs::write(&bad, "values: []").unwrap();
        assert!(FileUtils::load_object_from_config_file::<Blob>(&bad).is_err());
    }

    #[test]
    fn dataset_location_is_keyed_by_name() {
        let p = DataDirUtils::get_path_to_data_dir_location(Path::new("/tmp/d"), DataDirLocation::Dataset { key: "3circle".to_string() });
        assert_eq!(p, Path::new("/tmp/d/landscape/3circle.json"));
    }
}
