use glam::DVec3;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }
}

/// Box of the octant selected by `index`: bit 0 picks the z half, bit 1 the
/// y half, bit 2 the x half. A set bit keeps the upper half.
pub fn create_child_aabb(aabb: &Aabb, index: usize) -> Aabb {
    let mut min = aabb.min;
    let mut max = aabb.max;
    let size = (max - min) * 0.5;

    if (index & 0b0001) > 0 {
        min.z += size.z;
    } else {
        max.z -= size.z;
    }
    if (index & 0b0010) > 0 {
        min.y += size.y;
    } else {
        max.y -= size.y;
    }
    if (index & 0b0100) > 0 {
        min.x += size.x;
    } else {
        max.x -= size.x;
    }

    Aabb::new(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octant_bits_select_axis_halves() {
        let parent = Aabb::new(DVec3::ZERO, DVec3::new(8.0, 8.0, 8.0));

        let lower = create_child_aabb(&parent, 0b000);
        assert_eq!(lower, Aabb::new(DVec3::ZERO, DVec3::new(4.0, 4.0, 4.0)));

        let upper_z = create_child_aabb(&parent, 0b001);
        assert_eq!(
            upper_z,
            Aabb::new(DVec3::new(0.0, 0.0, 4.0), DVec3::new(4.0, 4.0, 8.0))
        );

        let upper_y = create_child_aabb(&parent, 0b010);
        assert_eq!(
            upper_y,
            Aabb::new(DVec3::new(0.0, 4.0, 0.0), DVec3::new(4.0, 8.0, 4.0))
        );

        let upper_x = create_child_aabb(&parent, 0b100);
        assert_eq!(
            upper_x,
            Aabb::new(DVec3::new(4.0, 0.0, 0.0), DVec3::new(8.0, 4.0, 4.0))
        );

        let upper = create_child_aabb(&parent, 0b111);
        assert_eq!(upper, Aabb::new(DVec3::new(4.0, 4.0, 4.0), parent.max));
    }

    #[test]
    fn octants_partition_the_parent_at_the_midplanes() {
        let parent = Aabb::new(DVec3::new(-2.0, 0.0, 4.0), DVec3::new(6.0, 4.0, 16.0));
        let mid = (parent.min + parent.max) * 0.5;

        for index in 0..8 {
            let child = create_child_aabb(&parent, index);

            let expected_min = DVec3::new(
                if index & 0b100 > 0 { mid.x } else { parent.min.x },
                if index & 0b010 > 0 { mid.y } else { parent.min.y },
                if index & 0b001 > 0 { mid.z } else { parent.min.z },
            );
            let expected_max = DVec3::new(
                if index & 0b100 > 0 { parent.max.x } else { mid.x },
                if index & 0b010 > 0 { parent.max.y } else { mid.y },
                if index & 0b001 > 0 { parent.max.z } else { mid.z },
            );

            assert_eq!(child.min, expected_min, "octant {index}");
            assert_eq!(child.max, expected_max, "octant {index}");
            assert_eq!(child.size() * 2.0, parent.size(), "octant {index}");
        }
    }
}
