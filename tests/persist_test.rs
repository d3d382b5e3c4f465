//! Save/load tests: round-trips, the legacy container shape, and the
//! NotFound / Malformed error split.

use scrapestack::{BuildOptions, Document, Error, ResultOptions, Scraper, Wanted};
use tempfile::TempDir;

fn trained_scraper() -> Scraper {
    let doc = Document::parse(
        r#"<div class="card">
            <h2 class="title">Widget</h2>
            <a class="more" href="/widget">details</a>
        </div>"#,
    );
    let mut scraper = Scraper::new();
    scraper
        .build(
            &doc,
            &Wanted::dict([
                ("title", vec!["Widget"]),
                ("link", vec!["https://example.com/widget"]),
            ]),
            &BuildOptions::new().with_url("https://example.com/catalog"),
        )
        .unwrap();
    scraper
}

// ============================================================================
// Round-Trips
// ============================================================================

#[test]
fn test_save_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.json");

    let scraper = trained_scraper();
    assert!(!scraper.stacks().is_empty());
    scraper.save(&path).unwrap();

    let mut loaded = Scraper::new();
    loaded.load(&path).unwrap();

    assert_eq!(loaded.stacks().len(), scraper.stacks().len());
    for (a, b) in loaded.stacks().iter().zip(scraper.stacks()) {
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.stack_id, b.stack_id);
        assert_eq!(a.alias, b.alias);
        assert_eq!(a.content, b.content);
        assert_eq!(a.wanted_attr, b.wanted_attr);
        assert_eq!(a.is_full_url, b.is_full_url);
        assert_eq!(a.is_non_rec_text, b.is_non_rec_text);
        assert_eq!(a.url, b.url);
    }
}

#[test]
fn test_loaded_model_still_matches() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.json");
    trained_scraper().save(&path).unwrap();

    let mut scraper = Scraper::new();
    scraper.load(&path).unwrap();

    let page = Document::parse(
        r#"<div class="card">
            <h2 class="title">Gadget</h2>
            <a class="more" href="/gadget">details</a>
        </div>"#,
    );
    let result = scraper
        .get_result_similar(&page, &ResultOptions::new().with_url("https://example.com"))
        .unwrap();
    assert!(result.contains(&"Gadget".to_string()));
    assert!(result.contains(&"https://example.com/gadget".to_string()));
}

#[test]
fn test_legacy_bare_array_loads_identically() {
    let dir = TempDir::new().unwrap();
    let object_path = dir.path().join("object.json");
    let array_path = dir.path().join("array.json");

    let scraper = trained_scraper();
    scraper.save(&object_path).unwrap();

    // Rewrite the same records as a bare array, the older on-disk shape
    let object_text = std::fs::read_to_string(&object_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&object_text).unwrap();
    let array_text = serde_json::to_string(&value["stack_list"]).unwrap();
    std::fs::write(&array_path, array_text).unwrap();

    let mut from_object = Scraper::new();
    from_object.load(&object_path).unwrap();
    let mut from_array = Scraper::new();
    from_array.load(&array_path).unwrap();

    let ids = |s: &Scraper| -> Vec<String> {
        s.stacks().iter().map(|x| x.stack_id.clone()).collect()
    };
    assert_eq!(ids(&from_object), ids(&from_array));
}

// ============================================================================
// Error Cases
// ============================================================================

#[test]
fn test_load_missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let mut scraper = Scraper::new();

    let err = scraper.load(dir.path().join("no-such.json")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_load_empty_file_is_malformed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.json");
    std::fs::write(&path, "").unwrap();

    let mut scraper = Scraper::new();
    let err = scraper.load(&path).unwrap_err();
    assert!(matches!(err, Error::Malformed(_)));
}

#[test]
fn test_load_garbage_is_malformed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("garbage.json");
    std::fs::write(&path, "{not json at all").unwrap();

    let mut scraper = Scraper::new();
    let err = scraper.load(&path).unwrap_err();
    assert!(matches!(err, Error::Malformed(_)));
}

// ============================================================================
// Hand-Written Files
// ============================================================================

#[test]
fn test_hand_written_rule_file_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hand.json");
    // A minimal record in the legacy array shape, with a triple content
    // entry and a class token list, as older writers produced.
    std::fs::write(
        &path,
        r#"[{
            "content": [["html", {}], ["body", {}, 0], ["p", {"class": ["note", "small"]}, 2]],
            "wanted_attr": null,
            "is_full_url": false,
            "is_non_rec_text": true,
            "url": "",
            "hash": "abcdef0123456789",
            "stack_id": "rule_abcdef01",
            "alias": "notes"
        }]"#,
    )
    .unwrap();

    let mut scraper = Scraper::new();
    scraper.load(&path).unwrap();

    assert_eq!(scraper.stacks().len(), 1);
    let stack = &scraper.stacks()[0];
    assert_eq!(stack.stack_id, "rule_abcdef01");
    assert_eq!(stack.alias, "notes");
    assert_eq!(stack.leaf().unwrap().tag, "p");
    assert_eq!(
        stack.leaf().unwrap().attrs.get("class").map(String::as_str),
        Some("note small")
    );
    assert!(stack.is_non_rec_text);
}
