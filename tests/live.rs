//! Runs the catalog against the real service. Needs network access, so it
//! only runs with `cargo test --features live`.

use indicatif::ProgressDrawTarget;
use reqres_quest::RequestProfile;
use reqres_quest::catalog;
use reqres_quest::logging::init_tracing;
use reqres_quest::run_suite;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;

#[tokio::test]
#[cfg_attr(not(feature = "live"), ignore)]
async fn catalog_passes_against_reqres() {
    init_tracing(true);

    // the public origin rejects requests without its free tier key
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("x-api-key"),
        HeaderValue::from_static("reqres-free-v1"),
    );

    let profile = RequestProfile::builder()
        .verbose(true)
        .headers(headers)
        .build()
        .unwrap();

    let summary = run_suite(
        profile,
        catalog::scenarios().unwrap(),
        ProgressDrawTarget::hidden(),
    )
    .await
    .unwrap();

    assert!(summary.is_success(), "{summary:?}");
}
