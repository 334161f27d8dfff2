//! View plugins shipped with the runtime.

mod applicability;
mod check_path;
mod string_resolver;
mod switch;
mod template;

pub use applicability::ApplicabilityPlugin;
pub use check_path::{CheckPathPlugin, Query};
pub use string_resolver::StringResolverPlugin;
pub use switch::SwitchPlugin;
pub use template::{
    ResolveSubstitutions, TemplateHooks, TemplateItemInfo, TemplatePlugin, TemplateSubstitution,
};
