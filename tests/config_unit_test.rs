//! Unit tests for configuration parsing.

use skycast::config::{parse_city_ids, DEFAULT_CITY_IDS};

#[test]
fn parses_comma_separated_city_ids() {
    assert_eq!(parse_city_ids("756135,3094802"), vec![756_135, 3_094_802]);
    assert_eq!(
        parse_city_ids(" 756135 , 3094802 "),
        vec![756_135, 3_094_802]
    );
}

#[test]
fn drops_unparseable_entries() {
    assert_eq!(parse_city_ids("756135,abc,3094802"), vec![756_135, 3_094_802]);
}

#[test]
fn falls_back_to_defaults_when_nothing_parses() {
    assert_eq!(parse_city_ids(""), DEFAULT_CITY_IDS.to_vec());
    assert_eq!(parse_city_ids("abc,def"), DEFAULT_CITY_IDS.to_vec());
}

#[test]
fn default_list_holds_the_ten_seed_cities() {
    assert_eq!(DEFAULT_CITY_IDS.len(), 10);
    assert!(DEFAULT_CITY_IDS.contains(&756_135)); // Warszawa
}
