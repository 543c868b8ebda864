//! visitor pattern helpers
//!
//! Walks over [crate::value::Value] trees used by the manifest rewrites.
mod visit_objects;
pub use visit_objects::VisitObjectsMut;

/// Visitor that visits its subjects mutably
pub trait VisitMut<T> {
    fn visit_mut(&mut self, value: &mut T);
}

/// Lets passes like [crate::manifest::sort_env_vars] hand a plain closure to
/// [VisitObjectsMut::visit_objects_mut] instead of declaring a visitor type
impl<T, F> VisitMut<T> for F
where
    F: FnMut(&mut T),
{
    fn visit_mut(&mut self, value: &mut T) {
        self(value)
    }
}
