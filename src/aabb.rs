use crate::nalgebra_types::*;

/// Axis aligned bounding box.
#[derive(Clone, Debug, PartialEq)]
pub struct AABB<T: RealField, const D: usize> {
    min: SVector<T, D>,
    max: SVector<T, D>,
}

impl<T: RealField, const D: usize> AABB<T, D> {
    pub fn from_point(c: SVector<T, D>) -> AABB<T, D> {
        AABB { min: c.clone(), max: c }
    }

    /// The smallest box holding every point, or `None` for no points.
    pub fn enclosing<'a, I>(mut points: I) -> Option<AABB<T, D>>
    where
        I: Iterator<Item = &'a SVector<T, D>>,
        T: 'a,
    {
        let first = points.next()?;
        let mut aabb = AABB::from_point(first.clone());
        for p in points {
            aabb.mut_add_point(p);
        }
        Some(aabb)
    }

    pub fn mut_add_point(&mut self, p: &SVector<T, D>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn min(&self) -> &SVector<T, D> {
        &self.min
    }

    pub fn max(&self) -> &SVector<T, D> {
        &self.max
    }

    /// Return the size of the Box.
    pub fn diagonal(&self) -> SVector<T, D> {
        &self.max - &self.min
    }
}
