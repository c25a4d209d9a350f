use std::fmt::Write;

fn write_header(yaml: &mut String, mode: &str) {
    writeln!(yaml, "version: \"0.4.0\"").ok();
    writeln!(yaml, "kind: app").ok();
    writeln!(yaml, "app:").ok();
    writeln!(yaml, "  mode: {}", mode).ok();
    writeln!(yaml, "workflow:").ok();
    writeln!(yaml, "  graph:").ok();
}

/// start -> n0 -> ... -> n{count-1} -> end, each step a template node that
/// references its predecessor.
pub fn build_linear_workflow(node_count: usize) -> String {
    let mut yaml = String::new();
    let node_count = node_count.max(1);
    write_header(&mut yaml, "workflow");

    writeln!(&mut yaml, "    nodes:").ok();
    writeln!(&mut yaml, "      - id: start").ok();
    writeln!(&mut yaml, "        data: {{ type: start, title: Start, variables: [] }}").ok();
    for i in 0..node_count {
        let prev = if i == 0 { "start".to_string() } else { format!("n{}", i - 1) };
        writeln!(&mut yaml, "      - id: n{}", i).ok();
        writeln!(&mut yaml, "        data:").ok();
        writeln!(&mut yaml, "          type: template-transform").ok();
        writeln!(&mut yaml, "          title: N{}", i).ok();
        writeln!(&mut yaml, "          template: \"{{{{#{}.output#}}}} and more\"", prev).ok();
        writeln!(&mut yaml, "          variables:").ok();
        writeln!(&mut yaml, "            - variable: input").ok();
        writeln!(&mut yaml, "              value_selector: [\"{}\", \"output\"]", prev).ok();
    }
    writeln!(&mut yaml, "      - id: end").ok();
    writeln!(&mut yaml, "        data: {{ type: end, title: End, outputs: [] }}").ok();

    writeln!(&mut yaml, "    edges:").ok();
    writeln!(&mut yaml, "      - {{ source: start, target: n0 }}").ok();
    for i in 0..(node_count - 1) {
        writeln!(&mut yaml, "      - {{ source: n{}, target: n{} }}", i, i + 1).ok();
    }
    writeln!(&mut yaml, "      - {{ source: n{}, target: end }}", node_count - 1).ok();

    yaml
}

/// start -> if-else with `branches` cases, each leading to its own answer.
pub fn build_branch_workflow(branches: usize) -> String {
    let mut yaml = String::new();
    let branches = branches.max(1);
    write_header(&mut yaml, "advanced-chat");

    writeln!(&mut yaml, "    nodes:").ok();
    writeln!(&mut yaml, "      - id: start").ok();
    writeln!(&mut yaml, "        data: {{ type: start, title: Start, variables: [] }}").ok();
    writeln!(&mut yaml, "      - id: if1").ok();
    writeln!(&mut yaml, "        data:").ok();
    writeln!(&mut yaml, "          type: if-else").ok();
    writeln!(&mut yaml, "          title: Branch").ok();
    writeln!(&mut yaml, "          cases:").ok();
    for i in 0..branches {
        writeln!(&mut yaml, "            - case_id: c{}", i).ok();
        writeln!(&mut yaml, "              logical_operator: and").ok();
        writeln!(&mut yaml, "              conditions:").ok();
        writeln!(&mut yaml, "                - variable_selector: [\"sys\", \"query\"]").ok();
        writeln!(&mut yaml, "                  comparison_operator: contains").ok();
        writeln!(&mut yaml, "                  value: \"k{}\"", i).ok();
    }
    for i in 0..branches {
        writeln!(&mut yaml, "      - id: b{}", i).ok();
        writeln!(
            &mut yaml,
            "        data: {{ type: answer, title: B{}, answer: \"branch {{{{#sys.query#}}}}\" }}",
            i
        )
        .ok();
    }

    writeln!(&mut yaml, "    edges:").ok();
    writeln!(&mut yaml, "      - {{ source: start, target: if1 }}").ok();
    for i in 0..branches {
        writeln!(
            &mut yaml,
            "      - {{ source: if1, target: b{}, sourceHandle: c{} }}",
            i, i
        )
        .ok();
    }
    yaml
}
