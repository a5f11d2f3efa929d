use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_types::region::Region;
use tracing::{debug, warn};

use crate::profile;

pub const DEFAULT_PROFILE: &str = "shotty";

/// Loads the SDK configuration for `profile`, falling back to the default
/// region chain when `region` is not given.
pub async fn configure_aws(profile: &str, region: Option<String>) -> aws_types::SdkConfig {
    match profile::profile_exists(profile) {
        Ok(true) => debug!(profile, "using AWS profile"),
        Ok(false) => warn!(
            profile,
            "AWS profile not found in ~/.aws/credentials or ~/.aws/config"
        ),
        Err(e) => warn!(profile, error = %e, "could not read AWS profile files"),
    }

    let region_provider = RegionProviderChain::first_try(region.map(Region::new))
        .or_default_provider();

    aws_config::defaults(BehaviorVersion::v2024_03_28())
        .profile_name(profile)
        .region(region_provider)
        .load()
        .await
}
