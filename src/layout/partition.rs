use crate::chart::SunburstConfig;
use crate::data::{format_number, Dataset, Record};
use crate::ir::{polar, Frame, Geometry, Label, Shape, Style};
use crate::palette::Rgb;
use crate::scale::ScaleConfig;
use std::collections::HashMap;
use std::f64::consts::TAU;

/// A node of the two-level partition: the root at depth 0, one child per category at depth 1.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionNode {
    pub name: String,
    pub depth: usize,
    pub value: f64,
    /// Angular extent in radians, clockwise from twelve o'clock.
    pub x0: f64,
    pub x1: f64,
    /// Radial extent.
    pub y0: f64,
    pub y1: f64,
    /// Fields of the first record in the category, plus `name` and `value`.
    pub datum: Record,
}

/// Group by `category`, sum `value`, and lay the groups out around a full circle.
///
/// Children are sorted by value descending (ties keep first-seen order). Invalid and
/// negative values count as 0. When every child is 0 all arcs have zero width.
pub fn partition(dataset: &Dataset, category: &str, value: &str, root: &str, radius: f64) -> Vec<PartitionNode> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, f64, Record)> = Vec::new();
    for record in dataset {
        if !record.has(category) {
            continue;
        }
        let name = record.label(category);
        let v = record.number_or(value, 0.0).max(0.0);
        match index.get(&name) {
            Some(&i) => groups[i].1 += v,
            None => {
                index.insert(name.clone(), groups.len());
                groups.push((name, v, record.clone()));
            }
        }
    }
    groups.sort_by(|a, b| b.1.total_cmp(&a.1));

    let total: f64 = groups.iter().map(|g| g.1).sum();
    let band = radius / 2.0;
    let mut nodes = vec![PartitionNode {
        name: root.to_string(),
        depth: 0,
        value: total,
        x0: 0.0,
        x1: TAU,
        y0: 0.0,
        y1: band,
        datum: Record::new().with("name", root).with("value", total),
    }];

    let mut angle = 0.0;
    for (name, v, first) in groups {
        let sweep = if total > 0.0 { v / total * TAU } else { 0.0 };
        let datum = first.with("name", name.as_str()).with("value", v);
        nodes.push(PartitionNode {
            name,
            depth: 1,
            value: v,
            x0: angle,
            x1: angle + sweep,
            y0: band,
            y1: radius,
            datum,
        });
        angle += sweep;
    }
    nodes
}

#[tracing::instrument(level = "debug", skip_all, fields(records = dataset.len()))]
pub fn layout(dataset: &Dataset, config: &SunburstConfig, frame: &Frame, scales: &ScaleConfig) -> Geometry {
    let mut geometry = Geometry::new(*frame);
    let (cx, cy) = frame.center();
    let nodes = partition(dataset, &config.category, &config.value, &config.root, frame.radius());

    for (i, node) in nodes.iter().filter(|n| n.depth > 0).enumerate() {
        geometry.push(
            node.name.clone(),
            node.datum.clone(),
            Shape::Arc {
                cx,
                cy,
                start_angle: node.x0,
                end_angle: node.x1,
                inner_radius: node.y0,
                outer_radius: node.y1,
            },
            Style::filled(scales.palette.categorical(i)).with_stroke(Rgb::WHITE, 2.0),
        );
        if node.value > config.label_threshold {
            let (lx, ly) = polar(cx, cy, (node.y0 + node.y1) / 2.0, (node.x0 + node.x1) / 2.0);
            geometry.labels.push(Label::new(lx, ly, node.name.clone()).sized(10.0).colored(Rgb::WHITE));
        }
    }

    let children = nodes.len() - 1;
    if children > 0 {
        geometry.labels.push(Label::new(cx, cy - 5.0, "Olympic Sports").sized(16.0));
        geometry.labels.push(
            Label::new(cx, cy + 15.0, format!("{} Sports", format_number(children as f64)))
                .sized(12.0)
                .colored(Rgb::GREY),
        );
    }
    geometry
}
