use std::time::Duration;

use miette::Diagnostic;
use miette::NamedSource;
use miette::SourceSpan;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use thiserror::Error;
use toml::Value;

use crate::parser::ProfileConfig;
use crate::parser::QuestConfig;
use crate::profile::DEFAULT_BASE_URL;
use crate::profile::DEFAULT_TIMEOUT;
use crate::profile::ParseUrlError;
use crate::profile::ProfileBuilder;
use crate::profile::RequestProfile;
use crate::profile::parse_url;

// Error messages for parsing URLs
const BASE_URL_ENDS_WITH: &str = "The base URL of the profile can't end with a /";
const TIMEOUT_IS_ZERO: &str = "timeout_secs has to be at least 1";

pub struct Validator {
    config: QuestConfig,
    toml_src: String,
    file_name: String,
}

/// A checked profile section, ready to be turned into a [`RequestProfile`].
#[derive(Debug, Clone)]
pub struct ProfileSettings {
    pub base_url: String,
    pub verbose: bool,
    pub timeout: Duration,
    pub headers: HeaderMap,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            verbose: false,
            timeout: DEFAULT_TIMEOUT,
            headers: HeaderMap::new(),
        }
    }
}

impl ProfileSettings {
    pub fn into_builder(self) -> ProfileBuilder {
        RequestProfile::builder()
            .base_url(self.base_url)
            .verbose(self.verbose)
            .timeout(self.timeout)
            .headers(self.headers)
    }
}

#[derive(Debug, Error, Diagnostic)]
#[error("Invalid field `{field}`: {message}")]
pub struct ValidationError {
    field: String,
    message: String,
    #[source_code]
    src: Option<NamedSource<String>>,
    #[label("invalid value here")]
    span: Option<SourceSpan>,
}

impl ValidationError {
    pub fn field(&self) -> &str {
        &self.field
    }
}

macro_rules! validation_err {
    ($field:expr, $msg:expr, $self:expr, $span:expr) => {
        ValidationError {
            field: $field.to_string(),
            message: $msg.to_string(),
            src: Some(NamedSource::new(
                $self.file_name.clone(),
                $self.toml_src.clone(),
            )),
            span: $span,
        }
    };
}

impl Validator {
    pub fn new(config: &QuestConfig, toml_src: &str, file_name: &str) -> Self {
        Self {
            config: config.clone(),
            toml_src: toml_src.into(),
            file_name: file_name.into(),
        }
    }

    pub fn validate(&self) -> miette::Result<ProfileSettings, ValidationError> {
        let Some(profile) = &self.config.profile else {
            return Ok(ProfileSettings::default());
        };

        Ok(ProfileSettings {
            base_url: self.validate_base_url(profile)?,
            verbose: profile.verbose.unwrap_or(false),
            timeout: self.validate_timeout(profile)?,
            headers: self.validate_headers(profile)?,
        })
    }

    fn validate_base_url(&self, profile: &ProfileConfig) -> Result<String, ValidationError> {
        let Some(base_url) = &profile.base_url else {
            return Ok(DEFAULT_BASE_URL.into());
        };

        parse_url(base_url, "/").map_err(|e| match e {
            ParseUrlError::SetupUrlEndsWithSlash => validation_err!(
                "profile.base_url",
                BASE_URL_ENDS_WITH,
                self,
                find_span(base_url, &self.toml_src)
            ),
            other => validation_err!(
                "profile.base_url",
                other,
                self,
                find_span(base_url, &self.toml_src)
            ),
        })?;

        Ok(base_url.clone())
    }

    fn validate_timeout(&self, profile: &ProfileConfig) -> Result<Duration, ValidationError> {
        match profile.timeout_secs {
            None => Ok(DEFAULT_TIMEOUT),
            Some(0) => Err(validation_err!(
                "profile.timeout_secs",
                TIMEOUT_IS_ZERO,
                self,
                find_key_span(&self.toml_src, "timeout_secs")
            )),
            Some(secs) => Ok(Duration::from_secs(secs)),
        }
    }

    fn validate_headers(&self, profile: &ProfileConfig) -> Result<HeaderMap, ValidationError> {
        let Some(value) = &profile.headers else {
            return Ok(HeaderMap::new());
        };

        let map = value.as_table().ok_or_else(|| {
            validation_err!(
                "profile.headers",
                format!("Expected a table for headers, got {value:?}"),
                self,
                find_key_span(&self.toml_src, "headers")
            )
        })?;

        let mut header_map = HeaderMap::new();
        for (k, v) in map {
            self.parse_single_header(&mut header_map, k, v)?;
        }

        Ok(header_map)
    }

    fn parse_single_header(
        &self,
        header_map: &mut HeaderMap,
        key: &str,
        value: &Value,
    ) -> Result<(), ValidationError> {
        let v_str = value.as_str().ok_or_else(|| {
            validation_err!(
                key,
                format!("Header value must be a string, got {value:?}"),
                self,
                find_key_span(&self.toml_src, key)
            )
        })?;

        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            validation_err!(
                key,
                format!("Invalid header name `{key}`: {e}"),
                self,
                find_key_span(&self.toml_src, key)
            )
        })?;

        let h_value = HeaderValue::from_str(v_str).map_err(|e| {
            validation_err!(
                key,
                format!("Invalid header value for `{key}`: {e}"),
                self,
                find_span(v_str, &self.toml_src)
            )
        })?;

        header_map.insert(name, h_value);
        Ok(())
    }
}

fn find_span(needle: &str, toml_src: &str) -> Option<SourceSpan> {
    let pattern = format!("\"{}\"", needle);
    toml_src
        .find(&pattern)
        .map(|start| SourceSpan::new((start + 1).into(), needle.len()))
}

fn find_key_span(toml_src: &str, key: &str) -> Option<SourceSpan> {
    // assumes the key is unique and takes its first occurrence
    let start = toml_src.find(key)?;
    Some(SourceSpan::new(start.into(), key.len()))
}

#[cfg(test)]
mod test {
    use super::*;

    fn validate(src: &str) -> Result<ProfileSettings, ValidationError> {
        let config: QuestConfig = toml::from_str(src).unwrap();
        Validator::new(&config, src, "reqres_quest.toml").validate()
    }

    #[test]
    fn missing_profile_uses_defaults() {
        let settings = validate("").unwrap();

        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.timeout, DEFAULT_TIMEOUT);
        assert!(!settings.verbose);
        assert!(settings.headers.is_empty());
    }

    #[test]
    fn full_profile() {
        let settings = validate(
            r#"
            [profile]
            base_url = "http://127.0.0.1:8080"
            verbose = true
            timeout_secs = 5

            [profile.headers]
            x-api-key = "reqres-free-v1"
            "#,
        )
        .unwrap();

        assert_eq!(settings.base_url, "http://127.0.0.1:8080");
        assert!(settings.verbose);
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.headers.get("x-api-key").unwrap(), "reqres-free-v1");

        let profile = settings.into_builder().build().unwrap();
        assert_eq!(profile.base_url(), "http://127.0.0.1:8080");
        assert!(profile.is_verbose());
    }

    #[test]
    fn trailing_slash_points_at_the_url() {
        let src = r#"
            [profile]
            base_url = "https://reqres.in/"
            "#;
        let err = validate(src).unwrap_err();

        assert_eq!(err.field(), "profile.base_url");
        let span = err.span.unwrap();
        assert_eq!(
            &src[span.offset()..span.offset() + span.len()],
            "https://reqres.in/"
        );
    }

    #[test]
    fn unparsable_base_url() {
        let err = validate(
            r#"
            [profile]
            base_url = "reqres.in"
            "#,
        )
        .unwrap_err();

        assert_eq!(err.field(), "profile.base_url");
        assert!(err.to_string().contains("Failed to parse URL"));
    }

    #[test]
    fn zero_timeout() {
        let err = validate(
            r#"
            [profile]
            timeout_secs = 0
            "#,
        )
        .unwrap_err();

        assert_eq!(err.field(), "profile.timeout_secs");
    }

    #[test]
    fn bad_headers() {
        let err = validate(
            r#"
            [profile.headers]
            x-retries = 3
            "#,
        )
        .unwrap_err();
        assert_eq!(err.field(), "x-retries");
        assert!(err.to_string().contains("must be a string"));

        let err = validate(
            r#"
            [profile.headers]
            "bad header" = "value"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid header name"));

        let err = validate(
            r#"
            [profile]
            headers = "x-api-key"
            "#,
        )
        .unwrap_err();
        assert_eq!(err.field(), "profile.headers");
    }
}
