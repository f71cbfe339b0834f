// dbt-contracts-core/src/infrastructure/parser.rs

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::domain::odcs::Contract;
use crate::domain::odps::DataProduct;
use crate::infrastructure::error::InfrastructureError;

fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, InfrastructureError> {
    let content = fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|source| InfrastructureError::Document {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_contract(path: &Path) -> Result<Contract, InfrastructureError> {
    load_document(path)
}

pub fn load_product(path: &Path) -> Result<DataProduct, InfrastructureError> {
    load_document(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_load_product() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("p.odps.yaml");
        fs::write(&path, "id: p\nname: Product\ninputPorts: []\n")?;

        let product = load_product(&path)?;
        assert_eq!(product.id, "p");
        Ok(())
    }

    #[test]
    fn test_parse_error_names_the_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.odcs.yaml");
        fs::write(&path, "schema: [unclosed\n")?;

        let err = load_contract(&path).unwrap_err();
        assert!(matches!(&err, InfrastructureError::Document { path: p, .. } if *p == path));
        assert!(err.to_string().contains("broken.odcs.yaml"));
        Ok(())
    }
}
