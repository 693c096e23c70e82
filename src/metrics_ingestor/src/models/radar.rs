use serde::{Deserialize, Deserializer, Serialize};

/// Weekly-ish traffic volume series for one location.
///
/// `timestamps` and `values` are parallel arrays.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficSeries {
    #[serde(default)]
    pub timestamps: Vec<String>,
    #[serde(default, deserialize_with = "numbers_or_strings")]
    pub values: Vec<f64>,
}

/// Bandwidth percentile series for one location.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitySeries {
    #[serde(default)]
    pub timestamps: Vec<String>,
    #[serde(default, deserialize_with = "numbers_or_strings")]
    pub p25: Vec<f64>,
    #[serde(default, deserialize_with = "numbers_or_strings")]
    pub p50: Vec<f64>,
    #[serde(default, deserialize_with = "numbers_or_strings")]
    pub p75: Vec<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

/// Radar serialises numeric series as either JSON numbers or numeric strings.
fn numbers_or_strings<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<NumberOrString>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|v| match v {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| serde::de::Error::custom(format!("not a number: {s:?}"))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_numeric_encodings_decode() {
        let s: QualitySeries = serde_json::from_str(
            r#"{"timestamps":["2024-01-01T00:00:00Z"],"p25":["1.5"],"p50":[2],"p75":["3.25"]}"#,
        )
        .unwrap();
        assert_eq!(s.p25, vec![1.5]);
        assert_eq!(s.p50, vec![2.0]);
        assert_eq!(s.p75, vec![3.25]);
    }

    #[test]
    fn garbage_string_is_rejected() {
        let err = serde_json::from_str::<TrafficSeries>(
            r#"{"timestamps":["2024-01-01T00:00:00Z"],"values":["n/a"]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not a number"));
    }
}
