//! Property tests for path-segment validation.

use proptest::prelude::*;
use sigrel_core::{Coordinate, FileName, Version};

proptest! {
    /// Anything built from the permitted alphabet without a leading dot is accepted.
    #[test]
    fn safe_segments_are_accepted(s in "[A-Za-z0-9_+-][A-Za-z0-9._+-]{0,40}") {
        prop_assume!(!s.eq_ignore_ascii_case("latest"));
        prop_assume!(!s.eq_ignore_ascii_case("version.json") && !s.eq_ignore_ascii_case("signature.der"));
        prop_assert!(Coordinate::new(&s, &s, &s, &s).is_ok());
        prop_assert!(Version::new(s.clone()).is_ok());
    }

    /// No accepted segment ever contains a separator or starts a relative path.
    #[test]
    fn accepted_segments_never_traverse(s in "\\PC{0,40}") {
        if let Ok(v) = Version::new(s.clone()) {
            prop_assert!(!v.as_str().contains('/'));
            prop_assert!(!v.as_str().contains('\\'));
            prop_assert!(!v.as_str().starts_with('.'));
        }
    }

    /// Upload names always reduce to a single safe component or fail.
    #[test]
    fn upload_names_reduce_to_basename(dir in "[a-z/\\\\]{0,20}", base in "[a-z0-9]{1,12}") {
        let raw = format!("{dir}/{base}");
        let name = FileName::from_upload(Some(&raw)).unwrap();
        prop_assert_eq!(name.as_str(), base.as_str());
    }
}
