//! Fixed mock herd for the cattle tracking view. The sensor API does not
//! serve livestock positions yet, so this mirrors the static deployment data
//! the dashboard has always shipped.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activity {
    Grazing,
    Resting,
    Moving,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Health {
    Good,
    Fair,
    Alert,
}

#[derive(Clone, Debug)]
pub struct HerdMember {
    pub id: u32,
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub activity: Activity,
    pub health: Health,
}

impl HerdMember {
    pub fn inside_boundary(&self) -> bool {
        inside_boundary(self.lat, self.lng)
    }
}

/// Farm boundary rectangle, lat/lng corners in draw order.
pub const FARM_BOUNDARY: [(f64, f64); 4] = [
    (8.9760, 7.3750),
    (8.9760, 7.3775),
    (8.9740, 7.3775),
    (8.9740, 7.3750),
];

pub fn herd() -> Vec<HerdMember> {
    vec![
        HerdMember { id: 1, name: "Bessie", lat: 8.97507, lng: 7.37631, activity: Activity::Grazing, health: Health::Good },
        HerdMember { id: 2, name: "Daisy", lat: 8.97530, lng: 7.37660, activity: Activity::Resting, health: Health::Good },
        HerdMember { id: 3, name: "Moobert", lat: 8.97480, lng: 7.37600, activity: Activity::Moving, health: Health::Fair },
        HerdMember { id: 4, name: "Clarabelle", lat: 8.97550, lng: 7.37700, activity: Activity::Grazing, health: Health::Good },
        HerdMember { id: 5, name: "Ferdinand", lat: 8.97470, lng: 7.37580, activity: Activity::Resting, health: Health::Alert },
    ]
}

/// Containment check against the axis-aligned boundary rectangle.
pub fn inside_boundary(lat: f64, lng: f64) -> bool {
    let lat_min = FARM_BOUNDARY.iter().map(|(lat, _)| *lat).fold(f64::INFINITY, f64::min);
    let lat_max = FARM_BOUNDARY.iter().map(|(lat, _)| *lat).fold(f64::NEG_INFINITY, f64::max);
    let lng_min = FARM_BOUNDARY.iter().map(|(_, lng)| *lng).fold(f64::INFINITY, f64::min);
    let lng_max = FARM_BOUNDARY.iter().map(|(_, lng)| *lng).fold(f64::NEG_INFINITY, f64::max);
    lat >= lat_min && lat <= lat_max && lng >= lng_min && lng <= lng_max
}

pub fn strays(herd: &[HerdMember]) -> Vec<&HerdMember> {
    herd.iter().filter(|member| !member.inside_boundary()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn herd_is_five_animals() {
        let herd = herd();
        assert_eq!(herd.len(), 5);
        assert_eq!(herd[0].name, "Bessie");
    }

    #[test]
    fn boundary_contains_grazing_positions() {
        assert!(inside_boundary(8.97507, 7.37631));
        assert!(!inside_boundary(8.9800, 7.37631));
        assert!(!inside_boundary(8.97507, 7.3800));
    }

    #[test]
    fn mock_herd_is_entirely_fenced_in() {
        assert!(strays(&herd()).is_empty());
    }

    #[test]
    fn stray_detection_flags_out_of_bounds_animal() {
        let mut herd = herd();
        herd[4].lng = 7.3800;
        let strays = strays(&herd);
        assert_eq!(strays.len(), 1);
        assert_eq!(strays[0].name, "Ferdinand");
    }
}
