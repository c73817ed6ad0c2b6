// Deterministic seed catalog: 4 albums, 20 tracks.

use super::entity::{Album, BaseCatalog, Track};

const GENRES: [&str; 5] = ["Pop", "Indie Rock", "Hip-Hop", "Electronic", "Jazz"];
const LABELS: [&str; 4] = [
    "Huevify Records",
    "Algorithm Audio",
    "Binary Bass Inc.",
    "NullSet Music",
];
const ARTISTS: [&str; 4] = ["The Algorithms", "Binary Beats", "Null Pointer", "Stack Overflow"];
const SAMPLE_MP3: &str = "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-1.mp3";

const ALBUM_COUNT: usize = 4;
const TRACK_COUNT: usize = 20;

/// Stable pseudo-random value in [0, 1) for a seed
fn seeded_random(seed: u64) -> f64 {
    let x = (seed as f64).sin() * 10000.0;
    x - x.floor()
}

/// Seed codes are unique by their numeric prefix
fn seed_code(index: usize) -> String {
    let letter = |seed: u64| (b'A' + (seeded_random(seed) * 26.0) as u8 % 26) as char;
    let digit = (seeded_random(index as u64 * 31 + 7) * 10.0) as u8 % 10;
    format!(
        "{:03}{}{}{}",
        index,
        letter(index as u64 * 13 + 1),
        letter(index as u64 * 17 + 2),
        digit
    )
}

impl BaseCatalog {
    pub fn seeded() -> Self {
        let mut albums: Vec<Album> = (1..=ALBUM_COUNT)
            .map(|i| Album {
                id: format!("a{}", i),
                title: format!("Album {}", i),
                artist: ARTISTS[i % ARTISTS.len()].to_string(),
                covers: (1..=3)
                    .map(|c| format!("https://picsum.photos/300/300?random={}", i * 10 + c))
                    .collect(),
                track_ids: Vec::new(),
                year: 2020 + i as i32,
                release_date: None,
                record_label: Some(LABELS[i % LABELS.len()].to_string()),
                release_type: None,
                main_artists: Vec::new(),
            })
            .collect();

        let mut tracks = Vec::with_capacity(TRACK_COUNT);
        for i in 1..=TRACK_COUNT {
            let album = &mut albums[i % ALBUM_COUNT];
            let id = format!("t{}", i);
            tracks.push(Track {
                id: id.clone(),
                title: format!("Track Number {}", i),
                artist: ARTISTS[i % ARTISTS.len()].to_string(),
                album: album.title.clone(),
                cover: album.covers[0].clone(),
                duration: 180.0 + (seeded_random(i as u64) * 120.0).floor(),
                url: SAMPLE_MP3.to_string(),
                plays: (seeded_random(i as u64 * 100) * 500_000.0).floor() as u64,
                genre: GENRES[i % GENRES.len()].to_string(),
                explicit: false,
                feat: None,
                hueq: Some(seed_code(i)),
                main_artists: Vec::new(),
            });
            album.track_ids.push(id);
        }

        Self { tracks, albums }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identifiers::is_catalog_code;
    use std::collections::HashSet;

    #[test]
    fn test_seed_is_deterministic() {
        assert_eq!(BaseCatalog::seeded(), BaseCatalog::seeded());
    }

    #[test]
    fn test_seed_shape() {
        let base = BaseCatalog::seeded();
        assert_eq!(base.albums.len(), ALBUM_COUNT);
        assert_eq!(base.tracks.len(), TRACK_COUNT);
        let listed: usize = base.albums.iter().map(|a| a.track_ids.len()).sum();
        assert_eq!(listed, TRACK_COUNT);
        assert!(base.tracks.iter().all(|t| (180.0..300.0).contains(&t.duration)));
        assert!(base.tracks.iter().all(|t| t.plays < 500_000));
    }

    #[test]
    fn test_seed_codes_are_unique_and_well_formed() {
        let base = BaseCatalog::seeded();
        let codes: HashSet<_> = base.tracks.iter().filter_map(|t| t.hueq.clone()).collect();
        assert_eq!(codes.len(), TRACK_COUNT);
        assert!(codes.iter().all(|c| is_catalog_code(c)));
    }
}
