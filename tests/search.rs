use fiscal_map::models::RegionRef;
use fiscal_map::search::{DEFAULT_LIMIT, SearchIndex};

fn names(results: &[RegionRef]) -> Vec<&str> {
    results.iter().map(|r| r.name.as_str()).collect()
}

fn index(list: &[&str]) -> SearchIndex {
    SearchIndex::new(
        list.iter()
            .enumerate()
            .map(|(i, n)| RegionRef::new(format!("S{i}"), *n)),
        DEFAULT_LIMIT,
    )
}

#[test]
fn substring_match_keeps_list_order() {
    let idx = index(&["Glasgow East", "Falkirk", "Glasgow North"]);
    assert_eq!(names(&idx.search("glas")), ["Glasgow East", "Glasgow North"]);
    assert_eq!(names(&idx.search("  NORTH ")), ["Glasgow North"]);
    assert_eq!(names(&idx.search("kirk")), ["Falkirk"]);
}

#[test]
fn blank_query_returns_nothing() {
    let idx = index(&["Glasgow East", "Falkirk"]);
    assert!(idx.search("").is_empty());
    assert!(idx.search("   ").is_empty());
    assert!(idx.search("Dundee").is_empty());
}

#[test]
fn results_are_capped() {
    let many: Vec<String> = (1..=12).map(|i| format!("Glasgow {i}")).collect();
    let refs: Vec<&str> = many.iter().map(String::as_str).collect();
    let idx = index(&refs);
    let hits = idx.search("glasgow");
    assert_eq!(hits.len(), 5);
    assert_eq!(hits[0].name, "Glasgow 1");
    assert_eq!(hits[4].name, "Glasgow 5");

    let wide = SearchIndex::new(hits.iter().cloned(), 2);
    assert_eq!(wide.search("g").len(), 2);
}
