use serde::Deserialize;

use crate::providers::ProviderError;

/// Common wrapper of Radar v4 responses.
#[derive(Deserialize, Debug)]
pub struct RadarEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<RadarMessage>,
    pub result: Option<RadarResult<T>>,
}

fn default_success() -> bool {
    true
}

#[derive(Deserialize, Debug)]
pub struct RadarMessage {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

/// Series requested with `name=main` come back under `result.main`.
#[derive(Deserialize, Debug)]
pub struct RadarResult<T> {
    pub main: T,
}

impl<T> RadarEnvelope<T> {
    pub fn into_main(self) -> Result<T, ProviderError> {
        match (self.success, self.result) {
            (true, Some(result)) => Ok(result.main),
            _ => {
                let text = self
                    .errors
                    .iter()
                    .map(|e| match e.code {
                        Some(code) => format!("{code}: {}", e.message),
                        None => e.message.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(ProviderError::Api(if text.is_empty() {
                    "response without result".to_string()
                } else {
                    text
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::radar::TrafficSeries;

    #[test]
    fn failure_lists_error_codes() {
        let env: RadarEnvelope<TrafficSeries> = serde_json::from_str(
            r#"{"success":false,"errors":[{"code":10000,"message":"Authentication error"}],"result":null}"#,
        )
        .unwrap();
        assert_eq!(
            env.into_main().unwrap_err().to_string(),
            "API error: 10000: Authentication error"
        );
    }
}
