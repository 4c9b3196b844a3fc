mod common;

use common::{API, ScriptedFetcher, card_json, named_url, print_url};
use proxy_deck::*;
use serde_json::json;
use std::path::Path;

fn resolver<'a>(dir: &Path, fetcher: &'a ScriptedFetcher) -> CardResolver<ResponseCache<&'a ScriptedFetcher>> {
    let cache = ResponseCache::open_in_dir(dir, fetcher).unwrap();
    let options = ResolverOptions {
        api_base: API.to_string(),
        ..Default::default()
    };
    CardResolver::new(CardDatabase::new(cache, API), options)
}

fn bolt_fetcher(localized_status: u16, localized_image_status: &str) -> ScriptedFetcher {
    ScriptedFetcher::new()
        .json(&named_url("Lightning Bolt"), 200, card_json("Lightning Bolt", "2xm", "117", "en", "highres_scan"))
        .json(
            &print_url("2xm", "117", Some("pt")),
            localized_status,
            json!({
                "name": "Lightning Bolt",
                "printed_name": "Relâmpago",
                "lang": "pt",
                "set": "2xm",
                "collector_number": "117",
                "type_line": "Instant",
                "image_status": localized_image_status,
                "image_uris": {"png": "https://img.test/2xm/117/pt.png"},
                "scryfall_uri": "https://db.test/card/2xm/117/pt",
            }),
        )
        .json(
            &print_url("2xm", "117", None),
            200,
            card_json("Lightning Bolt", "2xm", "117", "en", "highres_scan"),
        )
}

#[test]
fn test_localized_print_is_preferred() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = bolt_fetcher(200, "highres_scan");
    let mut resolver = resolver(dir.path(), &fetcher);

    let mut card = Card::new("Lightning Bolt", 4, None);
    resolver.resolve(&mut card, false);

    let resolution = card.resolution().expect("card should resolve");
    assert_eq!(resolution.name, "Relâmpago");
    assert_eq!(resolution.language, "pt");
    assert_eq!(resolution.card_type, "Instant");
    assert_eq!(resolution.version.as_deref(), Some("2xm"));
    assert_eq!(resolution.border_color, [0, 0, 0]);
    assert_eq!(
        resolution.image,
        ImageSource::Remote("https://img.test/2xm/117/pt.png".to_string())
    );
    assert_eq!(resolution.source_url.as_deref(), Some("https://db.test/card/2xm/117/pt"));
    assert_eq!(card.sanitized_name, "Lightning_Bolt");

    assert_eq!(fetcher.count_of(&print_url("2xm", "117", None)), 0);
    assert_eq!(fetcher.request_count(), 2);
}

#[test]
fn test_placeholder_image_falls_back_to_english_once() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = bolt_fetcher(200, "placeholder");
    let mut resolver = resolver(dir.path(), &fetcher);

    let mut card = Card::new("Lightning Bolt", 1, None);
    resolver.resolve(&mut card, false);

    assert_eq!(fetcher.count_of(&print_url("2xm", "117", None)), 1);
    assert_eq!(fetcher.request_count(), 3);

    let resolution = card.resolution().unwrap();
    assert_eq!(resolution.language, "en");
    assert_eq!(resolution.name, "Lightning Bolt");
    assert_eq!(
        resolution.image,
        ImageSource::Remote("https://img.test/2xm/117/en.png".to_string())
    );
}

#[test]
fn test_lowres_and_missing_images_fall_back() {
    for status in ["lowres", "missing"] {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = bolt_fetcher(200, status);
        let mut resolver = resolver(dir.path(), &fetcher);

        let mut card = Card::new("Lightning Bolt", 1, None);
        resolver.resolve(&mut card, false);

        assert_eq!(card.resolution().unwrap().language, "en", "{status}");
    }
}

#[test]
fn test_missing_localized_print_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = bolt_fetcher(404, "highres_scan");
    let mut resolver = resolver(dir.path(), &fetcher);

    let mut card = Card::new("Lightning Bolt", 1, None);
    resolver.resolve(&mut card, false);

    assert_eq!(fetcher.count_of(&print_url("2xm", "117", None)), 1);
    assert_eq!(card.resolution().unwrap().language, "en");
}

#[test]
fn test_unknown_card_stays_unresolved() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = bolt_fetcher(200, "highres_scan");
    let mut resolver = resolver(dir.path(), &fetcher);

    let cards = vec![
        Card::new("Definitely Not A Card", 1, None),
        Card::new("Lightning Bolt", 2, None),
    ];
    let cards = resolver.resolve_all(cards, false);

    assert_eq!(cards.len(), 2);
    assert!(!cards[0].is_resolved());
    assert!(cards[1].is_resolved());
}

#[test]
fn test_both_prints_failing_leaves_card_unresolved() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = ScriptedFetcher::new().json(
        &named_url("Opt"),
        200,
        card_json("Opt", "xln", "65", "en", "highres_scan"),
    );
    let mut resolver = resolver(dir.path(), &fetcher);

    let mut card = Card::new("Opt", 1, None);
    resolver.resolve(&mut card, false);

    assert!(!card.is_resolved());
    assert_eq!(fetcher.count_of(&print_url("xln", "65", None)), 1);
}

#[test]
fn test_requested_version_filters_fuzzy_search() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = ScriptedFetcher::new()
        .json(
            &format!("{API}/cards/named?fuzzy=Opt&set=dom"),
            200,
            card_json("Opt", "dom", "60", "en", "highres_scan"),
        )
        .json(
            &print_url("dom", "60", Some("pt")),
            200,
            card_json("Opt", "dom", "60", "pt", "highres_scan"),
        );
    let mut resolver = resolver(dir.path(), &fetcher);

    let mut card = Card::new("Opt", 1, Some("dom".to_string()));
    resolver.resolve(&mut card, false);

    assert_eq!(card.version(), Some("dom"));
    assert_eq!(card.resolution().unwrap().language, "pt");
}

#[test]
fn test_multi_faced_record_takes_last_face() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = ScriptedFetcher::new()
        .json(
            &named_url("Delver of Secrets"),
            200,
            json!({"name": "Delver of Secrets // Insectile Aberration", "set": "isd", "collector_number": "51"}),
        )
        .json(
            &print_url("isd", "51", Some("pt")),
            200,
            json!({
                "name": "Delver of Secrets // Insectile Aberration",
                "set": "isd",
                "collector_number": "51",
                "image_status": "highres_scan",
                "card_faces": [
                    {
                        "name": "Delver of Secrets",
                        "printed_name": "Desvendador de Segredos",
                        "lang": "pt",
                        "type_line": "Creature — Human Wizard",
                        "image_uris": {"large": "https://img.test/front.jpg"},
                    },
                    {
                        "name": "Insectile Aberration",
                        "printed_name": "Aberração Insetoide",
                        "type_line": "Creature — Human Insect",
                        "image_uris": {"png": "https://img.test/back.png"},
                    },
                ],
            }),
        );
    let mut resolver = resolver(dir.path(), &fetcher);

    let mut card = Card::new("Delver of Secrets", 1, None);
    resolver.resolve(&mut card, false);

    let resolution = card.resolution().unwrap();
    assert_eq!(resolution.name, "Aberração Insetoide");
    assert_eq!(resolution.language, "en");
    assert_eq!(resolution.card_type, "Creature");
    assert_eq!(resolution.image, ImageSource::Remote("https://img.test/back.png".to_string()));
}

#[test]
fn test_tokens_expand_one_level() {
    let dir = tempfile::tempdir().unwrap();
    let goblin_uri = format!("{API}/cards/token-goblin");
    let emblem_uri = format!("{API}/cards/emblem-chandra");

    let mut parent = card_json("Krenko, Mob Boss", "m13", "139", "en", "highres_scan");
    parent["all_parts"] = json!([
        {"component": "combo_piece", "name": "Krenko, Mob Boss", "type_line": "Legendary Creature — Goblin Warrior", "uri": format!("{API}/cards/self")},
        {"component": "token", "name": "Goblin", "type_line": "Token Creature — Goblin", "uri": goblin_uri},
        {"component": "combo_piece", "name": "Chandra Emblem", "type_line": "Emblem", "uri": emblem_uri},
    ]);

    let mut goblin = card_json("Goblin", "tm13", "6", "en", "highres_scan");
    goblin["type_line"] = json!("Token Creature — Goblin");
    goblin["all_parts"] = json!([
        {"component": "token", "name": "Should Not Expand", "type_line": "Token", "uri": format!("{API}/cards/nested")},
    ]);

    let fetcher = ScriptedFetcher::new()
        .json(&named_url("Krenko, Mob Boss"), 200, parent.clone())
        .json(&print_url("m13", "139", Some("pt")), 200, card_json("Krenko, Mob Boss", "m13", "139", "pt", "highres_scan"))
        .json(&goblin_uri, 200, goblin.clone())
        .json(&print_url("tm13", "6", Some("pt")), 404, json!({"object": "error"}))
        .json(&print_url("tm13", "6", None), 200, goblin)
        .json(&emblem_uri, 200, card_json("Chandra Emblem", "tm13", "20", "en", "highres_scan"))
        .json(&print_url("tm13", "20", Some("pt")), 200, card_json("Chandra Emblem", "tm13", "20", "pt", "highres_scan"));
    let mut resolver = resolver(dir.path(), &fetcher);

    let cards = resolver.resolve_all(vec![Card::new("Krenko, Mob Boss", 1, None)], true);

    let names: Vec<&str> = cards.iter().map(|c| c.name()).collect();
    assert_eq!(names, ["Krenko, Mob Boss", "Goblin", "Chandra Emblem"]);
    assert!(cards.iter().all(Card::is_resolved));
    assert_eq!(cards[1].quantity, 1);
    assert_eq!(cards[1].resolution().unwrap().card_type, "Token");
    assert_eq!(fetcher.count_of(&format!("{API}/cards/nested")), 0);
    assert_eq!(fetcher.count_of(&format!("{API}/cards/self")), 0);
}

#[test]
fn test_tokens_ignored_without_flag() {
    let dir = tempfile::tempdir().unwrap();
    let mut parent = card_json("Krenko, Mob Boss", "m13", "139", "en", "highres_scan");
    parent["all_parts"] = json!([
        {"component": "token", "name": "Goblin", "type_line": "Token Creature — Goblin", "uri": format!("{API}/cards/token-goblin")},
    ]);
    let fetcher = ScriptedFetcher::new()
        .json(&named_url("Krenko, Mob Boss"), 200, parent)
        .json(&print_url("m13", "139", Some("pt")), 200, card_json("Krenko, Mob Boss", "m13", "139", "pt", "highres_scan"));
    let mut resolver = resolver(dir.path(), &fetcher);

    let cards = resolver.resolve_all(vec![Card::new("Krenko, Mob Boss", 1, None)], false);
    assert_eq!(cards.len(), 1);
}

#[test]
fn test_tokens_queued_when_parent_print_fails() {
    let dir = tempfile::tempdir().unwrap();
    let goblin_uri = format!("{API}/cards/token-goblin");
    let mut parent = card_json("Krenko, Mob Boss", "m13", "139", "en", "highres_scan");
    parent["all_parts"] = json!([
        {"component": "token", "name": "Goblin", "type_line": "Token Creature — Goblin", "uri": goblin_uri},
    ]);

    let fetcher = ScriptedFetcher::new()
        .json(&named_url("Krenko, Mob Boss"), 200, parent)
        .json(&print_url("m13", "139", Some("pt")), 404, json!({"object": "error"}))
        .json(&print_url("m13", "139", None), 404, json!({"object": "error"}))
        .json(&goblin_uri, 200, card_json("Goblin", "tm13", "6", "en", "highres_scan"))
        .json(&print_url("tm13", "6", Some("pt")), 200, card_json("Goblin", "tm13", "6", "pt", "highres_scan"));
    let mut resolver = resolver(dir.path(), &fetcher);

    let cards = resolver.resolve_all(vec![Card::new("Krenko, Mob Boss", 1, None)], true);

    assert_eq!(cards.len(), 2);
    assert!(!cards[0].is_resolved());
    assert_eq!(cards[1].name(), "Goblin");
    assert!(cards[1].is_resolved());
    assert_eq!(fetcher.count_of(&goblin_uri), 1);
}

#[test]
fn test_malformed_localized_record_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = ScriptedFetcher::new()
        .json(&named_url("Opt"), 200, card_json("Opt", "xln", "65", "en", "highres_scan"))
        .json(&print_url("xln", "65", Some("pt")), 200, json!({"object": "card", "name": "Opt", "lang": "pt"}))
        .json(&print_url("xln", "65", None), 200, card_json("Opt", "xln", "65", "en", "highres_scan"));
    let mut resolver = resolver(dir.path(), &fetcher);

    let mut card = Card::new("Opt", 1, None);
    resolver.resolve(&mut card, false);

    let resolution = card.resolution().expect("English print should be used");
    assert_eq!(resolution.language, "en");
    assert_eq!(fetcher.count_of(&print_url("xln", "65", None)), 1);
}

#[test]
fn test_unparseable_localized_record_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = ScriptedFetcher::new()
        .json(&named_url("Opt"), 200, card_json("Opt", "xln", "65", "en", "highres_scan"))
        .json(&print_url("xln", "65", Some("pt")), 200, json!(["not", "a", "card"]))
        .json(&print_url("xln", "65", None), 200, card_json("Opt", "xln", "65", "en", "highres_scan"));
    let mut resolver = resolver(dir.path(), &fetcher);

    let mut card = Card::new("Opt", 1, None);
    resolver.resolve(&mut card, false);

    assert!(card.is_resolved());
    assert_eq!(fetcher.request_count(), 3);
}

#[test]
fn test_custom_image_short_circuits_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let custom = tempfile::tempdir().unwrap();
    std::fs::write(custom.path().join("Treasure_Map.png"), b"png").unwrap();

    let fetcher = ScriptedFetcher::new();
    let cache = ResponseCache::open_in_dir(dir.path(), &fetcher).unwrap();
    let options = ResolverOptions {
        custom_images_dir: Some(custom.path().to_path_buf()),
        api_base: API.to_string(),
        ..Default::default()
    };
    let mut resolver = CardResolver::new(CardDatabase::new(cache, API), options);

    let mut card = Card::new("Treasure Map", 1, None);
    resolver.resolve(&mut card, true);

    let resolution = card.resolution().unwrap();
    assert_eq!(resolution.language, CUSTOM_IMAGE_LANGUAGE);
    assert_eq!(resolution.card_type, "Token");
    assert_eq!(resolution.image, ImageSource::Local(custom.path().join("Treasure_Map.png")));
    assert_eq!(fetcher.request_count(), 0);
}

#[test]
fn test_card_back_needs_no_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = ScriptedFetcher::new();
    let mut resolver = resolver(dir.path(), &fetcher);

    let mut card = Card::new("MTG Back", 2, None);
    resolver.resolve(&mut card, false);

    assert_eq!(
        card.resolution().unwrap().image,
        ImageSource::Remote(CARD_BACK_URL.to_string())
    );
    assert_eq!(fetcher.request_count(), 0);
}

#[test]
fn test_second_run_is_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = bolt_fetcher(200, "placeholder");
    {
        let mut first = resolver(dir.path(), &fetcher);
        first.resolve_all(vec![Card::new("Lightning Bolt", 1, None)], false);
    }
    assert_eq!(fetcher.request_count(), 3);

    let offline = ScriptedFetcher::new();
    let mut second = resolver(dir.path(), &offline);
    let cards = second.resolve_all(vec![Card::new("Lightning Bolt", 1, None)], false);

    assert!(cards[0].is_resolved());
    assert_eq!(offline.request_count(), 0);
}

#[test]
fn test_fill_to_capacity_tops_up_last_page() {
    let dir = tempfile::tempdir().unwrap();
    let random_url = format!("{API}/cards/random");
    let fetcher = bolt_fetcher(200, "highres_scan")
        .sequence(
            &random_url,
            vec![
                json!({"name": "Definitely Not A Card"}),
                json!({"name": "Lightning Bolt"}),
                json!({"name": "Lightning Bolt"}),
            ],
        );
    let mut resolver = resolver(dir.path(), &fetcher);

    let mut cards = resolver.resolve_all(vec![Card::new("Lightning Bolt", 7, None)], false);
    let added = fill_to_capacity(&mut resolver, &mut cards, 9);

    assert_eq!(added, 2);
    assert_eq!(cards.len(), 3);
    assert_eq!(fetcher.count_of(&random_url), 3);
    let total: usize = cards.iter().map(|c| c.quantity).sum();
    assert_eq!(total % 9, 0);
}

#[test]
fn test_fill_to_capacity_gives_up_after_attempt_cap() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = bolt_fetcher(200, "highres_scan");
    let mut resolver = resolver(dir.path(), &fetcher);

    let mut cards = resolver.resolve_all(vec![Card::new("Lightning Bolt", 8, None)], false);
    let added = fill_to_capacity(&mut resolver, &mut cards, 9);

    assert_eq!(added, 0);
    assert_eq!(fetcher.count_of(&format!("{API}/cards/random")), 5);
}
