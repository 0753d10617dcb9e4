use trajsim_flightplan::{
    AltitudeDescriptor, ProcedureType, RoutePoint, SpeedDescriptor, TaxiWaypoint,
};
use trajsim_geodesy::{distance_ft, heading_rad};

use crate::WaypointError;

#[derive(Debug, Clone, PartialEq)]
pub struct WaypointNode {
    pub name: String,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub altitude_estimate_ft: Option<f64>,
    pub alt_desc: AltitudeDescriptor,
    pub alt_1_ft: Option<f64>,
    pub alt_2_ft: Option<f64>,
    pub speed_limit_knots: Option<f64>,
    pub speed_desc: SpeedDescriptor,
    pub procedure_name: String,
    /// `None` for surface nodes.
    pub proctype: Option<ProcedureType>,
    /// Great-circle heading to the next node; `None` on the last node.
    pub course_rad_to_next_node: Option<f64>,
    pub distance_to_next_node_ft: Option<f64>,
    prev: Option<usize>,
    next: Option<usize>,
}

impl WaypointNode {
    fn surface(waypoint: &TaxiWaypoint) -> Self {
        Self {
            name: waypoint.id.clone(),
            lat_deg: waypoint.lat_deg,
            lon_deg: waypoint.lon_deg,
            altitude_estimate_ft: None,
            alt_desc: AltitudeDescriptor::Unconstrained,
            alt_1_ft: None,
            alt_2_ft: None,
            speed_limit_knots: None,
            speed_desc: SpeedDescriptor::Unconstrained,
            procedure_name: String::new(),
            proctype: None,
            course_rad_to_next_node: None,
            distance_to_next_node_ft: None,
            prev: None,
            next: None,
        }
    }

    fn airborne(point: &RoutePoint) -> Self {
        Self {
            name: point.name.clone(),
            lat_deg: point.lat_deg,
            lon_deg: point.lon_deg,
            altitude_estimate_ft: point.altitude_estimate_ft(),
            alt_desc: point.alt_desc,
            alt_1_ft: point.alt_1_ft,
            alt_2_ft: point.alt_2_ft,
            speed_limit_knots: point.speed_limit_knots,
            speed_desc: point.speed_desc,
            procedure_name: point.procedure_name.clone(),
            proctype: Some(point.proctype),
            course_rad_to_next_node: None,
            distance_to_next_node_ft: None,
            prev: None,
            next: None,
        }
    }

    pub fn prev(&self) -> Option<usize> {
        self.prev
    }

    pub fn next(&self) -> Option<usize> {
        self.next
    }
}

/// One segment's nodes in flying order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaypointList {
    nodes: Vec<WaypointNode>,
    toc_index: Option<usize>,
    tod_index: Option<usize>,
}

impl WaypointList {
    pub fn from_route(route: &[RoutePoint], toc_index: Option<usize>, tod_index: Option<usize>) -> Self {
        let mut list = Self::link(route.iter().map(WaypointNode::airborne).collect());
        list.toc_index = toc_index.filter(|&i| i < list.len());
        list.tod_index = tod_index.filter(|&i| i < list.len());
        list
    }

    pub fn from_taxi(waypoints: &[TaxiWaypoint]) -> Self {
        Self::link(waypoints.iter().map(WaypointNode::surface).collect())
    }

    fn link(mut nodes: Vec<WaypointNode>) -> Self {
        let len = nodes.len();
        for i in 0..len {
            nodes[i].prev = i.checked_sub(1);
            nodes[i].next = (i + 1 < len).then_some(i + 1);
        }
        let mut list = Self {
            nodes,
            toc_index: None,
            tod_index: None,
        };
        for i in 0..len.saturating_sub(1) {
            list.update_leg(i);
        }
        list
    }

    /// Recompute the outbound course and distance of node `i`.
    fn update_leg(&mut self, i: usize) {
        let Some(next) = self.nodes[i].next else {
            self.nodes[i].course_rad_to_next_node = None;
            self.nodes[i].distance_to_next_node_ft = None;
            return;
        };
        let (a, b) = (&self.nodes[i], &self.nodes[next]);
        let course = heading_rad(a.lat_deg, a.lon_deg, b.lat_deg, b.lon_deg);
        let distance = distance_ft(a.lat_deg, a.lon_deg, b.lat_deg, b.lon_deg, 0.0);
        self.nodes[i].course_rad_to_next_node = Some(course);
        self.nodes[i].distance_to_next_node_ft = Some(distance);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn head(&self) -> Option<usize> {
        (!self.nodes.is_empty()).then_some(0)
    }

    pub fn final_index(&self) -> Option<usize> {
        self.nodes.len().checked_sub(1)
    }

    pub fn toc_index(&self) -> Option<usize> {
        self.toc_index
    }

    pub fn tod_index(&self) -> Option<usize> {
        self.tod_index
    }

    pub fn get(&self, index: usize) -> Option<&WaypointNode> {
        self.nodes.get(index)
    }

    /// Nodes in `next` order starting at the head.
    pub fn iter(&self) -> impl Iterator<Item = &WaypointNode> + '_ {
        std::iter::successors(self.head().map(|h| &self.nodes[h]), move |node| {
            node.next.map(|n| &self.nodes[n])
        })
        .take(self.nodes.len())
    }

    /// Walk `next` from the head and return the number of nodes reached.
    ///
    /// Fails if the walk does not end within `len()` steps or leaves nodes unvisited.
    pub fn traverse_len(&self) -> Result<usize, WaypointError> {
        let len = self.nodes.len();
        let mut reached = 0;
        let mut cursor = self.head();
        while let Some(i) = cursor {
            reached += 1;
            if reached > len {
                return Err(WaypointError::Cycle { len });
            }
            cursor = self.nodes.get(i).and_then(|n| n.next);
        }
        if reached != len {
            return Err(WaypointError::Disconnected { reached, len });
        }
        Ok(reached)
    }

    /// Move node `index` and refresh the legs touching it.
    pub fn set_position(&mut self, index: usize, lat_deg: f64, lon_deg: f64) -> Result<(), WaypointError> {
        let len = self.nodes.len();
        let node = self
            .nodes
            .get_mut(index)
            .ok_or(WaypointError::IndexOutOfRange { index, len })?;
        node.lat_deg = lat_deg;
        node.lon_deg = lon_deg;
        if let Some(prev) = node.prev {
            self.update_leg(prev);
        }
        self.update_leg(index);
        Ok(())
    }
}
