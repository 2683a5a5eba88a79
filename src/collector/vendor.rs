//! BMC vendor classification from the system manufacturer string.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    Unknown,
    Dell,
    Hpe,
    Lenovo,
    Inspur,
    H3c,
    Inventec,
    Fujitsu,
    Supermicro,
}

/// Ordered manufacturer keywords; the first keyword contained in the
/// lower-cased manufacturer decides the vendor.
pub const KEYWORDS: [(&str, Vendor); 9] = [
    ("dell", Vendor::Dell),
    ("sustainable", Vendor::Dell), // Dell "Sustainable" rebrand of the manufacturer field
    ("hpe", Vendor::Hpe),
    ("lenovo", Vendor::Lenovo),
    ("inspur", Vendor::Inspur),
    ("h3c", Vendor::H3c),
    ("inventec", Vendor::Inventec),
    ("fujitsu", Vendor::Fujitsu),
    ("supermicro", Vendor::Supermicro),
];

impl Vendor {
    pub fn classify(manufacturer: &str) -> Self {
        let manufacturer = manufacturer.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(keyword, _)| manufacturer.contains(keyword))
            .map(|(_, vendor)| *vendor)
            .unwrap_or(Vendor::Unknown)
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Vendor::Unknown => "Unknown",
            Vendor::Dell => "Dell",
            Vendor::Hpe => "HPE",
            Vendor::Lenovo => "Lenovo",
            Vendor::Inspur => "Inspur",
            Vendor::H3c => "H3C",
            Vendor::Inventec => "Inventec",
            Vendor::Fujitsu => "Fujitsu",
            Vendor::Supermicro => "Supermicro",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dell_and_rebrand_alias() {
        assert_eq!(Vendor::classify("Dell Inc."), Vendor::Dell);
        assert_eq!(Vendor::classify("DELL"), Vendor::Dell);
        assert_eq!(Vendor::classify("Sustainable Computing"), Vendor::Dell);
    }

    #[test]
    fn supermicro_any_case() {
        assert_eq!(Vendor::classify("Supermicro"), Vendor::Supermicro);
        assert_eq!(Vendor::classify("SUPERMICRO COMPUTER INC"), Vendor::Supermicro);
    }

    #[test]
    fn remaining_vendors() {
        assert_eq!(Vendor::classify("HPE"), Vendor::Hpe);
        assert_eq!(Vendor::classify("Lenovo"), Vendor::Lenovo);
        assert_eq!(Vendor::classify("Inspur"), Vendor::Inspur);
        assert_eq!(Vendor::classify("New H3C Technologies Co., Ltd."), Vendor::H3c);
        assert_eq!(Vendor::classify("Inventec"), Vendor::Inventec);
        assert_eq!(Vendor::classify("FUJITSU"), Vendor::Fujitsu);
    }

    #[test]
    fn no_keyword_is_unknown() {
        assert_eq!(Vendor::classify("Acme Servers"), Vendor::Unknown);
        assert_eq!(Vendor::classify(""), Vendor::Unknown);
    }

    #[test]
    fn first_keyword_wins() {
        // "dell" precedes "supermicro" and "hpe" precedes "lenovo"
        assert_eq!(Vendor::classify("Supermicro for Dell"), Vendor::Dell);
        assert_eq!(Vendor::classify("Lenovo HPE bundle"), Vendor::Hpe);
    }

    #[test]
    fn keyword_order_is_pinned() {
        let order: Vec<&str> = KEYWORDS.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            order,
            vec!["dell", "sustainable", "hpe", "lenovo", "inspur", "h3c", "inventec", "fujitsu", "supermicro"]
        );
    }
}
