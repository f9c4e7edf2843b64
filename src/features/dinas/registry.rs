//! Static registry of responsible dinas (municipal departments) and the
//! deterministic category -> dinas routing table. Pure lookups only; the
//! registry is fixed at build time and never mutated at runtime.

use crate::features::tickets::models::{Category, TicketStatus, Urgency};

#[derive(Debug, Clone, Copy)]
pub struct Dinas {
    pub id: &'static str,
    pub name: &'static str,
    pub categories: &'static [Category],
}

/// Catch-all assignee for OTHER and for any unroutable complaint.
/// Routing never produces an empty assignee list.
pub const FALLBACK_DINAS: &str = "sekretariat-daerah";

pub const REGISTRY: &[Dinas] = &[
    Dinas {
        id: "polrestabes-bandung",
        name: "Polrestabes Bandung",
        categories: &[Category::Emergency],
    },
    Dinas {
        id: "psc-119",
        name: "PSC 119 Layanan Gawat Darurat",
        categories: &[Category::Emergency],
    },
    Dinas {
        id: "damkar-bandung",
        name: "Dinas Kebakaran dan Penanggulangan Bencana",
        categories: &[Category::Emergency],
    },
    Dinas {
        id: "dpu-bandung",
        name: "Dinas Pekerjaan Umum",
        categories: &[Category::Infrastructure],
    },
    Dinas {
        id: "dlh-bandung",
        name: "Dinas Lingkungan Hidup",
        categories: &[Category::Sanitation],
    },
    Dinas {
        id: "dinsos-bandung",
        name: "Dinas Sosial",
        categories: &[Category::Social],
    },
    Dinas {
        id: "sekretariat-daerah",
        name: "Sekretariat Daerah Kota Bandung",
        categories: &[Category::Other],
    },
];

/// Ordered assignees for a category. EMERGENCY fans out to all three
/// responder agencies; every other category maps to one dinas.
pub fn dinas_for(category: Category) -> Vec<String> {
    let ids: Vec<String> = REGISTRY
        .iter()
        .filter(|d| d.categories.contains(&category))
        .map(|d| d.id.to_string())
        .collect();

    if ids.is_empty() {
        vec![FALLBACK_DINAS.to_string()]
    } else {
        ids
    }
}

pub fn find(id: &str) -> Option<&'static Dinas> {
    REGISTRY.iter().find(|d| d.id == id)
}

/// Display name for a dinas id, falling back to the id itself
pub fn display_name(id: &str) -> &str {
    find(id).map(|d| d.name).unwrap_or(id)
}

pub fn category_label(category: Category) -> &'static str {
    match category {
        Category::Emergency => "Darurat",
        Category::Infrastructure => "Infrastruktur",
        Category::Sanitation => "Kebersihan",
        Category::Social => "Sosial",
        Category::Other => "Lainnya",
    }
}

pub fn urgency_label(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Critical => "Kritis",
        Urgency::High => "Tinggi",
        Urgency::Medium => "Sedang",
        Urgency::Low => "Rendah",
    }
}

pub fn status_label(status: TicketStatus) -> &'static str {
    match status {
        TicketStatus::Pending => "Menunggu",
        TicketStatus::InProgress => "Sedang Ditangani",
        TicketStatus::Resolved => "Selesai",
        TicketStatus::Escalated => "Dieskalasi",
        TicketStatus::Cancelled => "Dibatalkan",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_routes_to_at_least_one_dinas() {
        for category in Category::ALL {
            let assigned = dinas_for(category);
            assert!(!assigned.is_empty(), "{} routed to nobody", category);
        }
    }

    #[test]
    fn emergency_fans_out_in_order() {
        assert_eq!(
            dinas_for(Category::Emergency),
            vec!["polrestabes-bandung", "psc-119", "damkar-bandung"]
        );
    }

    #[test]
    fn single_dinas_categories() {
        assert_eq!(dinas_for(Category::Infrastructure), vec!["dpu-bandung"]);
        assert_eq!(dinas_for(Category::Sanitation), vec!["dlh-bandung"]);
        assert_eq!(dinas_for(Category::Social), vec!["dinsos-bandung"]);
        assert_eq!(dinas_for(Category::Other), vec![FALLBACK_DINAS]);
    }

    #[test]
    fn unknown_text_falls_back_to_catch_all() {
        // An unrecognized model label parses to Other, which routes to
        // the catch-all dinas.
        let category = Category::parse_or_other("definitely-not-a-category");
        assert_eq!(dinas_for(category), vec![FALLBACK_DINAS]);
    }

    #[test]
    fn display_name_falls_back_to_id() {
        assert_eq!(display_name("dpu-bandung"), "Dinas Pekerjaan Umum");
        assert_eq!(display_name("unknown-dinas"), "unknown-dinas");
    }
}
