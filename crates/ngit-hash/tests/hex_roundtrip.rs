use ngit_hash::ObjectId;
use proptest::prelude::*;

proptest! {
    #[test]
    fn oid_hex_roundtrip(bytes in prop::array::uniform20(any::<u8>())) {
        let oid = ObjectId::from_bytes(&bytes).unwrap();
        let hex = oid.to_hex();
        prop_assert!(ngit_hash::is_hex_oid(&hex));
        prop_assert_eq!(ObjectId::from_hex(&hex).unwrap(), oid);
    }

    #[test]
    fn random_strings_rarely_valid(s in "\\PC{0,60}") {
        let valid = ngit_hash::is_hex_oid(&s);
        if valid {
            prop_assert!(ObjectId::from_hex(&s).is_ok());
        }
    }
}
