//! Static reference structures published by the API
//!
//! Both tables double as the enumerations metadata is validated against.

use std::collections::BTreeMap;

/// Library always granted access to a deposit
pub const DEFAULT_LIBRARY: &str = "NKC";

/// RIV (research results register) categories: code → name
pub const RIV_CATEGORIES: &[(&str, &str)] = &[
    ("AA", "Filosofie a náboženství"),
    ("AB", "Dějiny"),
    ("AC", "Archeologie, antropologie, etnologie"),
    ("AD", "Politologie a politické vědy"),
    ("AE", "Řízení, správa a administrativa"),
    ("AF", "Dokumentace, knihovnictví, práce s informacemi"),
    ("AG", "Právní vědy"),
    ("AH", "Ekonomie"),
    ("AI", "Jazykověda"),
    ("AJ", "Písemnictví, mas-media, audiovize"),
    ("AK", "Sport a aktivity volného času"),
    ("AL", "Umění, architektura, kulturní dědictví"),
    ("AM", "Pedagogika a školství"),
    ("AN", "Psychologie"),
    ("AO", "Sociologie, demografie"),
    ("AP", "Městské, oblastní a dopravní plánování"),
    ("AQ", "Bezpečnost a ochrana zdraví, člověk - stroj"),
    ("BA", "Obecná matematika"),
    ("BB", "Aplikovaná statistika, operační výzkum"),
    ("BC", "Teorie a systémy řízení"),
    ("BD", "Teorie informace"),
    ("BE", "Teoretická fyzika"),
    ("CA", "Anorganická chemie"),
    ("CB", "Analytická chemie, separace"),
    ("CC", "Organická chemie"),
    ("DA", "Hydrologie a limnologie"),
    ("DB", "Geologie a mineralogie"),
    ("EA", "Buněčná biologie"),
    ("EB", "Genetika a molekulární biologie"),
    ("FA", "Kardiovaskulární nemoci včetně kardiochirurgie"),
    ("GA", "Zemědělská ekonomika"),
    ("IN", "Informatika"),
    ("JA", "Elektronika a optoelektronika, elektrotechnika"),
    ("JC", "Počítačový hardware a software"),
    ("KA", "Vojenství"),
];

/// Libraries that may be granted access: identifier → name
pub const LIBRARY_MAP: &[(&str, &str)] = &[
    ("NKC", "Národní knihovna České republiky"),
    ("MZK", "Moravská zemská knihovna v Brně"),
    ("SVKOS", "Moravskoslezská vědecká knihovna v Ostravě"),
    ("VKOL", "Vědecká knihovna v Olomouci"),
    ("SVKHK", "Studijní a vědecká knihovna v Hradci Králové"),
    ("SVKPL", "Studijní a vědecká knihovna Plzeňského kraje"),
    ("KNAV", "Knihovna Akademie věd ČR"),
    ("KJM", "Knihovna Jiřího Mahena v Brně"),
    ("MKP", "Městská knihovna v Praze"),
];

/// Whether `code` names a RIV category
pub fn is_riv_category(code: &str) -> bool {
    RIV_CATEGORIES.iter().any(|(c, _)| *c == code)
}

/// Whether `id` names a known library
pub fn is_known_library(id: &str) -> bool {
    LIBRARY_MAP.iter().any(|(l, _)| *l == id)
}

pub fn riv_map() -> BTreeMap<&'static str, &'static str> {
    RIV_CATEGORIES.iter().copied().collect()
}

pub fn library_map() -> BTreeMap<&'static str, &'static str> {
    LIBRARY_MAP.iter().copied().collect()
}
