//! Named gates and gate collections

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GateError, GateResult};
use crate::shape::{DataPoint, GateShape};

/// Default gate color
pub const DEFAULT_GATE_COLOR: &str = "#3b82f6";

/// A named region over a (x-channel, y-channel) scatter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    pub id: Uuid,
    pub name: String,
    /// CSS-style color string
    pub color: String,
    pub shape: GateShape,
    pub x_channel: String,
    pub y_channel: String,
    pub active: bool,
}

impl Gate {
    /// Create an active gate with a fresh id
    pub fn new(
        name: impl Into<String>,
        shape: GateShape,
        x_channel: impl Into<String>,
        y_channel: impl Into<String>,
    ) -> GateResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GateError::EmptyName);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            color: DEFAULT_GATE_COLOR.to_string(),
            shape,
            x_channel: x_channel.into(),
            y_channel: y_channel.into(),
            active: true,
        })
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Whether the gate applies to the given channel pair
    pub fn is_on(&self, x_channel: &str, y_channel: &str) -> bool {
        self.x_channel == x_channel && self.y_channel == y_channel
    }

    /// Membership mask over `points`
    pub fn mask(&self, points: &[DataPoint]) -> Vec<bool> {
        points.iter().map(|p| self.shape.contains(*p)).collect()
    }
}

/// How several active gates combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateCombine {
    /// Point must be inside every active gate
    #[default]
    All,
    /// Point must be inside at least one active gate
    Any,
}

/// Ordered collection of gates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateSet {
    gates: Vec<Gate>,
}

impl GateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Gate> {
        self.gates.iter()
    }

    /// Gates with `active` set
    pub fn active(&self) -> impl Iterator<Item = &Gate> {
        self.gates.iter().filter(|g| g.active)
    }

    /// Add a gate, returning its id
    pub fn add(&mut self, gate: Gate) -> Uuid {
        let id = gate.id;
        tracing::debug!(%id, name = %gate.name, shape = gate.shape.kind(), "gate added");
        self.gates.push(gate);
        id
    }

    pub fn remove(&mut self, id: Uuid) -> GateResult<Gate> {
        let pos = self
            .gates
            .iter()
            .position(|g| g.id == id)
            .ok_or(GateError::NotFound(id))?;
        Ok(self.gates.remove(pos))
    }

    pub fn get(&self, id: Uuid) -> Option<&Gate> {
        self.gates.iter().find(|g| g.id == id)
    }

    fn get_mut(&mut self, id: Uuid) -> GateResult<&mut Gate> {
        self.gates
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(GateError::NotFound(id))
    }

    /// Find a gate by name (first match)
    pub fn find_by_name(&self, name: &str) -> Option<&Gate> {
        self.gates.iter().find(|g| g.name == name)
    }

    pub fn rename(&mut self, id: Uuid, name: impl Into<String>) -> GateResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GateError::EmptyName);
        }
        self.get_mut(id)?.name = name;
        Ok(())
    }

    pub fn recolor(&mut self, id: Uuid, color: impl Into<String>) -> GateResult<()> {
        self.get_mut(id)?.color = color.into();
        Ok(())
    }

    /// Flip the active flag, returning the new value
    pub fn toggle(&mut self, id: Uuid) -> GateResult<bool> {
        let gate = self.get_mut(id)?;
        gate.active = !gate.active;
        Ok(gate.active)
    }

    /// Combined membership mask of the active gates
    ///
    /// With no active gates nothing is selected.
    pub fn mask(&self, points: &[DataPoint], combine: GateCombine) -> Vec<bool> {
        let active: Vec<&Gate> = self.active().collect();
        if active.is_empty() {
            return vec![false; points.len()];
        }
        points
            .iter()
            .map(|p| match combine {
                GateCombine::All => active.iter().all(|g| g.shape.contains(*p)),
                GateCombine::Any => active.iter().any(|g| g.shape.contains(*p)),
            })
            .collect()
    }

    /// Indices of the points selected by the active gates
    pub fn apply(&self, points: &[DataPoint], combine: GateCombine) -> Vec<usize> {
        selected_indices(&self.mask(points, combine))
    }
}

impl<'a> IntoIterator for &'a GateSet {
    type Item = &'a Gate;
    type IntoIter = std::slice::Iter<'a, Gate>;

    fn into_iter(self) -> Self::IntoIter {
        self.gates.iter()
    }
}

/// Count selected points
pub fn count_selected(mask: &[bool]) -> usize {
    mask.iter().filter(|&&b| b).count()
}

/// Get indices of selected points
pub fn selected_indices(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter(|(_, &b)| b)
        .map(|(i, _)| i)
        .collect()
}

/// Invert a selection mask
pub fn invert_mask(mask: &[bool]) -> Vec<bool> {
    mask.iter().map(|&b| !b).collect()
}
