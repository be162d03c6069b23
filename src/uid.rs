use uuid::Uuid;

/// Name-based GUID, the same seed always gives the same identifier.
pub fn new_guid(seed: &str) -> String {
	Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes()).to_string().to_ascii_uppercase()
}

#[test]
fn test_new_guid_is_stable() {
	let a = new_guid("xbase");
	assert_eq!(a, new_guid("xbase"));
	assert_ne!(a, new_guid("xhash"));
	assert_eq!(a.len(), 36);
	assert_eq!(a, a.to_ascii_uppercase());
}
