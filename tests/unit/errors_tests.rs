/*!
 * Tests for error types
 */

use dualsub::errors::{AppError, MergeError, ProviderError, TranslationError, Track};

#[test]
fn test_providerError_isRateLimited_shouldOnlyMatchThrottling() {
    assert!(ProviderError::RateLimitExceeded("quota".to_string()).is_rate_limited());
    assert!(!ProviderError::ConnectionError("reset".to_string()).is_rate_limited());
    assert!(
        !ProviderError::ApiError {
            status_code: 500,
            message: "boom".to_string()
        }
        .is_rate_limited()
    );
}

#[test]
fn test_mergeError_display_shouldNameTheCause() {
    let no_candidates = MergeError::NoCandidates {
        language: "fr".to_string(),
    };
    assert_eq!(no_candidates.to_string(), "No subtitle candidates found for language 'fr'");

    let degenerate = MergeError::Degenerate { side: Track::Secondary };
    assert_eq!(degenerate.to_string(), "Cannot merge: the secondary track is empty");
}

#[test]
fn test_errors_shouldConvertUpwards() {
    let provider = ProviderError::AuthenticationError("bad key".to_string());
    let merge: MergeError = provider.into();
    assert!(matches!(merge, MergeError::Provider(ProviderError::AuthenticationError(_))));

    let app: AppError = merge.into();
    assert!(app.to_string().starts_with("Merge error: Provider error"));

    let translation: TranslationError = ProviderError::RateLimitExceeded("slow down".to_string()).into();
    assert!(matches!(translation, TranslationError::Provider(ref e) if e.is_rate_limited()));
}

#[test]
fn test_mergeError_shouldSurviveAnyhowDowncast() {
    let err: anyhow::Error = MergeError::EmptyDownload {
        file_name: "movie.srt".to_string(),
    }
    .into();

    assert!(matches!(
        err.downcast_ref::<MergeError>(),
        Some(MergeError::EmptyDownload { .. })
    ));
}
