use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomType {
    LivingRoom,
    MasterRoom,
    Kitchen,
    Bathroom,
    DiningRoom,
    CommonRoom,
    SecondRoom,
    ChildRoom,
    StudyRoom,
    GuestRoom,
    Balcony,
    Entrance,
    Storage,
}

impl RoomType {
    pub const ALL: [RoomType; 13] = [
        Self::LivingRoom,
        Self::MasterRoom,
        Self::Kitchen,
        Self::Bathroom,
        Self::DiningRoom,
        Self::CommonRoom,
        Self::SecondRoom,
        Self::ChildRoom,
        Self::StudyRoom,
        Self::GuestRoom,
        Self::Balcony,
        Self::Entrance,
        Self::Storage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LivingRoom => "LivingRoom",
            Self::MasterRoom => "MasterRoom",
            Self::Kitchen => "Kitchen",
            Self::Bathroom => "Bathroom",
            Self::DiningRoom => "DiningRoom",
            Self::CommonRoom => "CommonRoom",
            Self::SecondRoom => "SecondRoom",
            Self::ChildRoom => "ChildRoom",
            Self::StudyRoom => "StudyRoom",
            Self::GuestRoom => "GuestRoom",
            Self::Balcony => "Balcony",
            Self::Entrance => "Entrance",
            Self::Storage => "Storage",
        }
    }
}

/// Compass position inside the outline; top of the sketch is north
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    North,
    Northwest,
    West,
    Southwest,
    South,
    Southeast,
    East,
    Northeast,
    Center,
}

impl LocationType {
    pub const ALL: [LocationType; 9] = [
        Self::North,
        Self::Northwest,
        Self::West,
        Self::Southwest,
        Self::South,
        Self::Southeast,
        Self::East,
        Self::Northeast,
        Self::Center,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::North => "north",
            Self::Northwest => "northwest",
            Self::West => "west",
            Self::Southwest => "southwest",
            Self::South => "south",
            Self::Southeast => "southeast",
            Self::East => "east",
            Self::Northeast => "northeast",
            Self::Center => "center",
        }
    }
}

/// Room size relative to the whole outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeType {
    #[serde(rename = "XL")]
    ExtraLarge,
    #[serde(rename = "L")]
    Large,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "S")]
    Small,
    #[serde(rename = "XS")]
    ExtraSmall,
}

impl SizeType {
    pub const ALL: [SizeType; 5] = [
        Self::ExtraLarge,
        Self::Large,
        Self::Medium,
        Self::Small,
        Self::ExtraSmall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtraLarge => "XL",
            Self::Large => "L",
            Self::Medium => "M",
            Self::Small => "S",
            Self::ExtraSmall => "XS",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(RoomType, LocationType, SizeType);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    #[serde(rename = "type", default)]
    pub room_type: Option<RoomType>,
    #[serde(default, deserialize_with = "links_without_nulls")]
    pub link: Vec<String>,
    #[serde(default)]
    pub location: Option<LocationType>,
    #[serde(default)]
    pub size: Option<SizeType>,
}

fn links_without_nulls<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let links: Option<Vec<Option<String>>> = Option::deserialize(deserializer)?;
    Ok(links.unwrap_or_default().into_iter().flatten().collect())
}

/// Flattened, display-friendly view of a room
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: String,
    pub link: String,
    pub location: String,
    pub size: String,
}

/// Structured floor plan description: named rooms with links between them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomGraph {
    pub rooms: Vec<Room>,
}

impl RoomGraph {
    pub fn new(rooms: Vec<Room>) -> Self {
        Self { rooms }
    }

    /// Parse and validate cleaned JSON text
    pub fn from_json(json_text: &str) -> Result<Self> {
        let graph: RoomGraph = serde_json::from_str(json_text)?;
        graph.validate()?;
        Ok(graph)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Names must be unique and every link must name another room in the graph
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for room in &self.rooms {
            if room.name.trim().is_empty() {
                return Err(PipelineError::Schema("room with empty name".to_string()));
            }
            if !names.insert(room.name.as_str()) {
                return Err(PipelineError::Schema(format!("duplicate room name '{}'", room.name)));
            }
        }

        for room in &self.rooms {
            for target in &room.link {
                if *target == room.name {
                    return Err(PipelineError::Schema(format!("room '{}' links to itself", room.name)));
                }
                if !names.contains(target.as_str()) {
                    return Err(PipelineError::Schema(format!(
                        "room '{}' links to unknown room '{}'",
                        room.name, target
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn find_room(&self, name: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn summary(&self) -> Vec<RoomSummary> {
        const UNKNOWN: &str = "Unknown";
        self.rooms
            .iter()
            .map(|room| RoomSummary {
                name: room.name.clone(),
                room_type: room.room_type.map_or(UNKNOWN.to_string(), |t| t.to_string()),
                link: if room.link.is_empty() {
                    UNKNOWN.to_string()
                } else {
                    room.link.join(", ")
                },
                location: room.location.map_or(UNKNOWN.to_string(), |l| l.to_string()),
                size: room.size.map_or(UNKNOWN.to_string(), |s| s.to_string()),
            })
            .collect()
    }
}
