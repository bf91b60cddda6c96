use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

const CULTURE: [&str; 12] = [
    "konzert", "band", "musik", "chor", "theater", "oper", "buehne", "festival", "album",
    "orchester", "saenger", "premiere",
];
const SPORT: [&str; 12] = [
    "fussball", "tor", "liga", "spiel", "trainer", "verein", "stadion", "meister", "saison",
    "abwehr", "sturm", "pokal",
];
const SHARED: [&str; 6] = ["stadt", "heute", "abend", "publikum", "jahr", "woche"];

/// Document-feature JSON in the shape the front end produces.
///
/// Ids start at 1. Even positions draw from one topic with peer labels above 0.5, odd
/// positions from the other with peer labels below it.
pub fn documents(count: usize, seed: u64) -> Vec<Value> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|idx| {
            let positive = idx % 2 == 0;
            let vocabulary: &[&str] = if positive { &CULTURE } else { &SPORT };
            let mut words = Vec::new();
            for _ in 0..rng.random_range(4..8) {
                words.push(*vocabulary.choose(&mut rng).unwrap_or(&"leer"));
            }
            words.push(*SHARED.choose(&mut rng).unwrap_or(&"leer"));
            let peer: f64 = if positive {
                rng.random_range(0.55..1.0)
            } else {
                rng.random_range(0.0..0.45)
            };
            json!({
                "id": idx + 1,
                "values": { "7": words.join(" "), "2": format!("Dokument {}", idx + 1) },
                "features": { "1": { "4": peer, "5": "unrelated" } }
            })
        })
        .collect()
}

pub fn write_documents(path: &Path, documents: &[Value]) {
    std::fs::write(path, serde_json::to_vec(documents).unwrap()).unwrap();
}
