use stride_core::model::PlanOutput;

pub fn format_plan(plan: &PlanOutput) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(plan)
}
