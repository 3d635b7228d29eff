use crate::{common::*, config::tree::Node, error::Result};

/// The `environment` section: run identity and output locations.
///
/// The output directory itself is created by the consuming trainer, never
/// by the loader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Environment {
    pub name: String,
    pub output_path: PathBuf,
    pub log_file: String,
}

impl Environment {
    pub(crate) fn bind(node: &Node) -> Result<Self> {
        Ok(Self {
            name: node.string("name")?,
            output_path: node.path_buf("output_path")?,
            log_file: node.string_or("log_file", "logs.txt")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tree::Node;

    #[test]
    fn binds_with_default_log_file() {
        let doc: Value = json5::from_str(r#"{ name: "run-1", output_path: "trainings" }"#).unwrap();
        let environment = Environment::bind(&Node::root(&doc).unwrap()).unwrap();
        assert_eq!(environment.name, "run-1");
        assert_eq!(environment.output_path, PathBuf::from("trainings"));
        assert_eq!(environment.log_file, "logs.txt");
    }

    #[test]
    fn name_is_required() {
        let doc: Value = json5::from_str(r#"{ output_path: "trainings" }"#).unwrap();
        let err = Environment::bind(&Node::root(&doc).unwrap()).unwrap_err();
        assert_eq!(err.path(), Some("name"));
    }
}
