use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::FileConfig;

/// Reads a run configuration; the extension selects TOML or JSON.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let contents = fs::read_to_string(path).map_err(|err| {
        Error::ConfigIo(format!(
            "failed to read config '{}': {}",
            path.display(),
            err
        ))
    })?;
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .unwrap_or("");

    parse_config(&contents, ext)
}

pub fn parse_config(contents: &str, ext: &str) -> Result<FileConfig> {
    match ext {
        "toml" => toml::from_str(contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse TOML: {}", err))),
        "json" => serde_json::from_str(contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse JSON: {}", err))),
        "" => Err(Error::UnsupportedConfigFormat("unknown".to_string())),
        _ => Err(Error::UnsupportedConfigFormat(ext.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrivals::ArrivalStrategy;
    use crate::catalog::{Catalog, NodeId};
    use crate::estimator::Metric;
    use crate::operators::Operator;

    #[test]
    fn empty_toml_falls_back_to_reference_scenario() {
        let config = parse_config("", "toml").expect("empty config should parse");
        assert_eq!(config.scenario.groups.len(), 3);
        assert_eq!(config.simulation.runs, 10);
        assert!(config.placement.is_none());
        assert!(Catalog::new(&config.scenario).is_ok());
    }

    #[test]
    fn toml_sections_override_defaults() {
        let contents = r#"
[simulation]
runs = 4
arrivals = "batched"

[optimizer]
operators = ["random", "swap_two"]
metric = "median"
control_variate = true

[placement]
ASN1 = [2, 6, 7, 8]
ASN2 = [5]
"#;
        let config = parse_config(contents, "toml").expect("config should parse");
        assert_eq!(config.simulation.runs, 4);
        assert_eq!(config.simulation.arrivals, ArrivalStrategy::Batched);
        assert_eq!(config.simulation.threshold, 60.0);
        assert_eq!(config.optimizer.operators, vec![Operator::Random, Operator::Swap(2)]);
        assert_eq!(config.optimizer.metric, Metric::Median);
        assert!(config.optimizer.control_variate);
        let placement = config.placement.expect("placement should be present");
        assert_eq!(placement.movies(NodeId::Asn1).len(), 4);
    }

    #[test]
    fn json_scenario_round_trips() {
        let original = FileConfig::default();
        let json = serde_json::to_string(&original).expect("config should serialize");
        let parsed = parse_config(&json, "json").expect("config should parse");
        assert_eq!(parsed.scenario.movie_sizes, original.scenario.movie_sizes);
        assert_eq!(
            parsed.scenario.groups[1].links.keys().collect::<Vec<_>>(),
            vec![&NodeId::Msn, &NodeId::Asn1, &NodeId::Asn2]
        );
    }

    #[test]
    fn unknown_operator_is_a_parse_error() {
        let err = parse_config("[optimizer]\noperators = [\"shuffle\"]\n", "toml").unwrap_err();
        assert!(err.to_string().contains("unknown operator 'shuffle'"));
    }

    #[test]
    fn unsupported_extensions_are_rejected() {
        assert_eq!(
            parse_config("", "yaml").unwrap_err().to_string(),
            "unsupported config format 'yaml'"
        );
        assert_eq!(
            parse_config("", "").unwrap_err().to_string(),
            "unsupported config format 'unknown'"
        );
    }
}
