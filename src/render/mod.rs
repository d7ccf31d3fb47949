pub mod annotate;
pub mod layout;

pub use annotate::{Annotation, AnnotationFragment, AnnotationRenderer, RenderInput};
pub use layout::Rect;
