//! Interaction plans: the DOM steps and synthetic events that drive one control.

pub mod plan;
pub mod radio;

pub use plan::{
    InteractionPlan, PlanError, checkbox_target, member_method, plan_checkbox, plan_click,
    plan_fill, plan_radio, plan_select, plan_submit, select_options,
};
pub use radio::{choose_member, member_value, radio_group, radios_within};
