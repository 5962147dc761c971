// src/data_structures.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::global_variables::{LANES_PER_ROAD, LANE_COUNT};

/// Longest vehicle id kept; longer ids are cut to this many characters.
pub const VEHICLE_ID_LEN: usize = 8;

/// One of the four roads meeting at the junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Road {
    A,
    B,
    C,
    D,
}

impl Road {
    pub const ALL: [Road; 4] = [Road::A, Road::B, Road::C, Road::D];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn letter(self) -> char {
        match self {
            Road::A => 'A',
            Road::B => 'B',
            Road::C => 'C',
            Road::D => 'D',
        }
    }

    pub fn from_letter(letter: char) -> Option<Road> {
        match letter {
            'A' => Some(Road::A),
            'B' => Some(Road::B),
            'C' => Some(Road::C),
            'D' => Some(Road::D),
            _ => None,
        }
    }
}

impl fmt::Display for Road {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A lane of the junction, identified by (road, lane position 1..=3).
///
/// The canonical order A1, A2, A3, B1, ... D3 gives every lane an index 0..12.
/// That index breaks priority ties and `index + 1` is the light number shown
/// to observers (0 meaning no light is green).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct LaneId {
    road: Road,
    lane: u8,
}

impl LaneId {
    /// The lane watched by high-priority mode.
    pub const A2: LaneId = LaneId {
        road: Road::A,
        lane: 2,
    };

    pub fn new(road: Road, lane: u8) -> Option<LaneId> {
        if (1..=LANES_PER_ROAD as u8).contains(&lane) {
            Some(LaneId { road, lane })
        } else {
            None
        }
    }

    pub fn from_index(index: usize) -> Option<LaneId> {
        if index >= LANE_COUNT {
            return None;
        }
        Some(LaneId {
            road: Road::ALL[index / LANES_PER_ROAD],
            lane: (index % LANES_PER_ROAD) as u8 + 1,
        })
    }

    /// Decodes a light number (1..=12). 0 and anything above 12 yield `None`.
    pub fn from_light(light: u8) -> Option<LaneId> {
        if light == 0 {
            return None;
        }
        LaneId::from_index(light as usize - 1)
    }

    /// All twelve lanes in canonical order.
    pub fn all() -> impl Iterator<Item = LaneId> {
        (0..LANE_COUNT).filter_map(LaneId::from_index)
    }

    pub fn road(self) -> Road {
        self.road
    }

    pub fn lane(self) -> u8 {
        self.lane
    }

    pub fn index(self) -> usize {
        self.road.index() * LANES_PER_ROAD + (self.lane as usize - 1)
    }

    pub fn light(self) -> u8 {
        self.index() as u8 + 1
    }
}

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}L{}", self.road, self.lane)
    }
}

impl FromStr for LaneId {
    type Err = String;

    /// Accepts the display form (`AL2`) and the short form (`A2`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let road = chars
            .next()
            .and_then(Road::from_letter)
            .ok_or_else(|| format!("unknown road in lane {:?}", s))?;
        let rest: String = chars.collect();
        let digits = rest.strip_prefix('L').unwrap_or(&rest);
        let lane = digits
            .parse::<u8>()
            .map_err(|_| format!("bad lane number in {:?}", s))?;
        LaneId::new(road, lane).ok_or_else(|| format!("lane out of range in {:?}", s))
    }
}

impl From<LaneId> for String {
    fn from(lane: LaneId) -> String {
        lane.to_string()
    }
}

impl TryFrom<String> for LaneId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A vehicle waiting at the junction. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    id: String,
    lane: LaneId,
}

impl Vehicle {
    /// Creates a vehicle, keeping at most the first 8 characters of `id`.
    pub fn new(id: &str, lane: LaneId) -> Self {
        Self {
            id: id.chars().take(VEHICLE_ID_LEN).collect(),
            lane,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn road(&self) -> Road {
        self.lane.road()
    }

    pub fn lane(&self) -> u8 {
        self.lane.lane()
    }

    pub fn lane_id(&self) -> LaneId {
        self.lane
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_matches_light_numbers() {
        let names: Vec<String> = LaneId::all().map(|l| l.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "AL1", "AL2", "AL3", "BL1", "BL2", "BL3", "CL1", "CL2", "CL3", "DL1", "DL2",
                "DL3"
            ]
        );
        assert_eq!(LaneId::A2.index(), 1);
        assert_eq!(LaneId::A2.light(), 2);
        assert_eq!(LaneId::from_light(12), LaneId::new(Road::D, 3));
        assert_eq!(LaneId::from_light(0), None);
        assert_eq!(LaneId::from_light(13), None);
    }

    #[test]
    fn lane_id_parses_both_forms() {
        assert_eq!("AL2".parse::<LaneId>(), Ok(LaneId::A2));
        assert_eq!("D3".parse::<LaneId>(), LaneId::new(Road::D, 3).ok_or(String::new()));
        assert!("E1".parse::<LaneId>().is_err());
        assert!("A4".parse::<LaneId>().is_err());
    }

    #[test]
    fn vehicle_id_is_truncated_to_eight_chars() {
        let v = Vehicle::new("ABCDEFGHIJK", LaneId::A2);
        assert_eq!(v.id(), "ABCDEFGH");
        assert_eq!(v.road(), Road::A);
        assert_eq!(v.lane(), 2);
    }
}
