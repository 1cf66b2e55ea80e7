//! Dictionary insert/lookup behavior over the memory store.

use keydex::{DocId, KeyDictionary, MemoryStore};

#[test]
fn inserted_keys_resolve_and_count() {
    let mut dictionary = KeyDictionary::new(MemoryStore::new());
    dictionary.insert(b"delta", DocId::new(4)).expect("insert");
    dictionary.insert(b"alpha", DocId::new(1)).expect("insert");
    dictionary.insert(b"omega", DocId::new(24)).expect("insert");

    assert_eq!(dictionary.entries(), 3);
    assert_eq!(
        dictionary.lookup(b"alpha").expect("lookup"),
        Some(DocId::new(1))
    );
    assert_eq!(
        dictionary.lookup(b"omega").expect("lookup"),
        Some(DocId::new(24))
    );
}

#[test]
fn miss_on_a_populated_dictionary_is_none() {
    let mut dictionary = KeyDictionary::new(MemoryStore::new());
    dictionary.insert(b"present", DocId::new(1)).expect("insert");

    let result = dictionary.lookup(b"absent").expect("lookup must not fail");
    assert_eq!(result, None);
}

#[test]
fn keys_are_binary_safe() {
    let mut dictionary = KeyDictionary::new(MemoryStore::new());
    let key = [0x00, 0xFF, 0x7F, 0x80, 0x0A];
    dictionary.insert(&key, DocId::new(42)).expect("insert");

    assert_eq!(dictionary.lookup(&key).expect("lookup"), Some(DocId::new(42)));
    assert_eq!(dictionary.lookup(&key[..4]).expect("lookup"), None);
}

#[test]
fn store_iteration_follows_key_order() {
    let mut dictionary = KeyDictionary::new(MemoryStore::new());
    for (key, id) in [("m", 2u32), ("a", 7), ("z", 1)] {
        dictionary
            .insert(key.as_bytes(), DocId::new(id))
            .expect("insert");
    }

    let keys: Vec<&[u8]> = dictionary.store().iter().map(|(key, _)| key).collect();
    assert_eq!(keys, vec![b"a".as_slice(), b"m".as_slice(), b"z".as_slice()]);
}
