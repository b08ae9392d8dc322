use crate::config::Config;
use crate::constants::AWS_SESSION_PROVIDER_NAME;
use anyhow::{bail, Context, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::Credentials;
use std::fmt;

/// Where AWS credentials come from.
#[derive(Clone, PartialEq, Eq)]
pub enum AwsCredentialSource {
    /// Access key pair given in the forwarder's own configuration.
    Static {
        access_key: String,
        secret_key: String,
    },
    Profile(String),
    /// The SDK default chain: environment, shared files, container or instance metadata.
    Env,
}

impl AwsCredentialSource {
    pub fn from_config(config: &Config) -> Self {
        match (&config.access_key, &config.secret_key, &config.aws_profile) {
            (Some(access_key), Some(secret_key), _) => AwsCredentialSource::Static {
                access_key: access_key.clone(),
                secret_key: secret_key.clone(),
            },
            (_, _, Some(profile)) => AwsCredentialSource::Profile(profile.clone()),
            _ => AwsCredentialSource::Env,
        }
    }
}

// never print the secret half
impl fmt::Display for AwsCredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AwsCredentialSource::Static { access_key, .. } => write!(f, "static:{}", access_key),
            AwsCredentialSource::Profile(profile) => write!(f, "profile:{}", profile),
            AwsCredentialSource::Env => write!(f, "env"),
        }
    }
}

impl fmt::Debug for AwsCredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

async fn load_with(source: &AwsCredentialSource, region: Option<&str>) -> Result<SdkConfig> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    loader = match source {
        AwsCredentialSource::Static {
            access_key,
            secret_key,
        } => {
            tracing::debug!("Loading AWS config with configured access key");
            loader.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                AWS_SESSION_PROVIDER_NAME,
            ))
        }
        AwsCredentialSource::Profile(profile) => {
            tracing::debug!("Trying to load AWS config using profile '{}'", profile);
            loader.profile_name(profile)
        }
        AwsCredentialSource::Env => {
            tracing::debug!("Trying to load AWS config from the default provider chain");
            loader
        }
    };
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }

    let config = loader.load().await;
    let provider = config
        .credentials_provider()
        .context("No AWS credentials provider available")?;
    provider
        .provide_credentials()
        .await
        .with_context(|| format!("Failed to get AWS credentials using {}", source))?;

    if config.region().is_none() {
        bail!("No AWS region configured; set REGION or AWS_REGION");
    }
    Ok(config)
}

/// Resolves an SDK config, falling back from a profile to the default chain.
///
/// Static keys never fall back: if they were configured they are meant to be used.
pub async fn resolve_aws_config(
    source: AwsCredentialSource,
    region: Option<&str>,
) -> Result<SdkConfig> {
    match load_with(&source, region).await {
        Ok(config) => {
            tracing::info!("Resolved AWS credentials using {}", source);
            Ok(config)
        }
        Err(err) if matches!(source, AwsCredentialSource::Profile(_)) => {
            tracing::warn!("Failed to resolve credentials using {}: {:#}", source, err);
            let config = load_with(&AwsCredentialSource::Env, region)
                .await
                .context("Could not resolve AWS credentials from profile or environment")?;
            tracing::info!("Resolved AWS credentials using environment.");
            Ok(config)
        }
        Err(err) => Err(err),
    }
}
