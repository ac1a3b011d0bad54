use crate::math::Vector;

/// Read-only world descriptor supplied by the content collaborator.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct WorldMap {
    /// Playable extent; positions live in `[0, size.x] × [0, size.z]`.
    pub size: Vector,
    #[cfg_attr(feature = "serde", serde(default))]
    pub spawn_locations: Vec<SpawnLocation>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub exits: Vec<Exit>,
}

impl WorldMap {
    pub fn new(size: Vector) -> Self {
        Self {
            size,
            spawn_locations: Vec::new(),
            exits: Vec::new(),
        }
    }

    pub fn with_spawn_location(mut self, location: SpawnLocation) -> Self {
        self.spawn_locations.push(location);
        self
    }

    pub fn with_exit(mut self, exit: Exit) -> Self {
        self.exits.push(exit);
        self
    }

    pub fn contains(&self, position: Vector) -> bool {
        (0.0..=self.size.x).contains(&position.x) && (0.0..=self.size.z).contains(&position.z)
    }

    /// Nearest point inside the map.
    pub fn clamp(&self, position: Vector) -> Vector {
        Vector::new(
            position.x.clamp(0.0, self.size.x.max(0.0)),
            position.z.clamp(0.0, self.size.z.max(0.0)),
        )
    }

    /// Spawn locations to try for a character, preferred origin first.
    pub fn spawn_candidates(&self, origin: Option<&str>) -> Vec<&SpawnLocation> {
        let preferred = origin.and_then(|origin| {
            self.spawn_locations
                .iter()
                .find(|location| location.origin.as_deref() == Some(origin))
        });
        preferred
            .into_iter()
            .chain(
                self.spawn_locations
                    .iter()
                    .filter(|location| !preferred.is_some_and(|p| std::ptr::eq(p, *location))),
            )
            .collect()
    }
}

/// Disk in which characters may appear.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpawnLocation {
    pub position: Vector,
    pub radius: f64,
    /// Tag matched against a character's origin.
    #[cfg_attr(feature = "serde", serde(default))]
    pub origin: Option<String>,
}

impl SpawnLocation {
    pub fn new(position: Vector, radius: f64) -> Self {
        Self {
            position,
            radius,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Portal that removes whoever walks into it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Exit {
    pub position: Vector,
    pub radius: f64,
    pub destination: String,
}

impl Exit {
    pub fn new(position: Vector, radius: f64, destination: impl Into<String>) -> Self {
        Self {
            position,
            radius,
            destination: destination.into(),
        }
    }
}
