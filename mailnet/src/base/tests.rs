use crate::auth::credentials::CredentialError;
use crate::base::neterror::NetError;

#[test]
fn test_net_error_codes() {
    assert_eq!(NetError::ConnectionRefused.as_i32(), -102);
    assert_eq!(NetError::TooManyRedirects.as_i32(), -310);
    assert_eq!(NetError::Unknown(-42).as_i32(), -42);
}

#[test]
fn test_session_codes_stay_out_of_chromium_range() {
    let session_errors = [
        NetError::malformed("x"),
        NetError::CheckDeadlineExceeded,
        NetError::LoginLoopDetected {
            url: "https://accounts.example.com/".to_string(),
        },
    ];
    for err in session_errors {
        assert!(err.as_i32() <= -10000, "{err:?} collides with Chromium codes");
    }
}

#[test]
fn test_logout_classification() {
    // Session-invalidating failures
    assert!(NetError::ConnectionFailed.is_logout_condition());
    assert!(NetError::ConnectionTimedOut.is_logout_condition());
    assert!(NetError::CheckDeadlineExceeded.is_logout_condition());
    assert!(NetError::LoginLoopDetected {
        url: "https://a.example.com/".into()
    }
    .is_logout_condition());
    assert!(NetError::credential_lookup(
        "user@example.com",
        CredentialError::NotFound {
            account: "user@example.com".into()
        }
    )
    .is_logout_condition());

    // Authentication succeeded or nothing ran
    assert!(!NetError::malformed("missing ld").is_logout_condition());
    assert!(!NetError::CheckInProgress {
        account: "user@example.com".into()
    }
    .is_logout_condition());
}

#[test]
fn test_error_display() {
    let err = NetError::malformed("metadata is not an array");
    assert_eq!(
        err.to_string(),
        "Malformed mailbox data: metadata is not an array"
    );
}
