//! Type inference: what a declared field type says about its argument.
//!
//! Only the common shapes are understood: `T`, `Optional[T]`, `List[T]` and
//! `Optional[List[T]]`. Anything more exotic leaves the base type unset and
//! expects the schema author to supply an explicit converter.

use tracing::trace;

use crate::{ScalarType, TypeExpr};

/// Result of [`infer_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InferredType {
    /// The scalar the argument converts to, when it could be determined.
    pub base: Option<ScalarType>,
    /// The declared type admits the absence marker.
    pub optional: bool,
    /// The declared type is a sequence.
    pub repeated: bool,
}

/// Infers base type, optionality and repetition from a declared type.
///
/// # Examples
///
/// ```
/// use record_opt_core::{ScalarType, TypeExpr, infer_type};
///
/// let inferred = infer_type(&TypeExpr::optional(TypeExpr::list(TypeExpr::INT)));
/// assert_eq!(inferred.base, Some(ScalarType::Int));
/// assert!(inferred.optional);
/// assert!(inferred.repeated);
///
/// // Multi-way unions are ambiguous.
/// let inferred = infer_type(&TypeExpr::union([TypeExpr::INT, TypeExpr::STR]));
/// assert_eq!(inferred.base, None);
/// ```
pub fn infer_type(ty: &TypeExpr) -> InferredType {
    let inferred = match ty {
        TypeExpr::Scalar(scalar) => InferredType {
            base: Some(*scalar),
            ..InferredType::default()
        },
        TypeExpr::Union(alts) if alts.contains(&TypeExpr::NoneType) => {
            let mut inferred = match alts.as_slice() {
                [TypeExpr::NoneType, inner] | [inner, TypeExpr::NoneType] => infer_type(inner),
                _ => InferredType::default(),
            };
            inferred.optional = true;
            inferred
        }
        TypeExpr::List(args) => {
            let base = match args.as_slice() {
                [inner] => {
                    let inner = infer_type(inner);
                    if inner.repeated { None } else { inner.base }
                }
                _ => None,
            };
            InferredType {
                base,
                optional: false,
                repeated: true,
            }
        }
        TypeExpr::Union(_) | TypeExpr::NoneType | TypeExpr::Any => InferredType::default(),
    };
    trace!(%ty, ?inferred, "inferred field type");
    inferred
}
