use crate::taxonomy::{Lineage, Rank};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

fn rank_color(rank: Rank) -> &'static str {
    match rank {
        Rank::Domain => "#1f77b4",
        Rank::Phylum => "#ff7f0e",
        Rank::Class => "#2ca02c",
        Rank::Order => "#d62728",
        Rank::Family => "#9467bd",
        Rank::Genus => "#8c564b",
        Rank::Species => "#e377c2",
    }
}

/// Node/link data for a plotly.js Sankey trace: links connect taxa at
/// adjacent ranks, weighted by the number of genomes sharing that edge.
#[derive(Debug, Default)]
pub struct SankeyDiagram {
    pub labels: Vec<String>,
    pub colors: Vec<&'static str>,
    pub sources: Vec<usize>,
    pub targets: Vec<usize>,
    pub values: Vec<usize>,
}

impl SankeyDiagram {
    fn node(&mut self, ids: &mut HashMap<String, usize>, label: String, rank: Rank) -> usize {
        if let Some(&id) = ids.get(&label) {
            return id;
        }
        let id = self.labels.len();
        ids.insert(label.clone(), id);
        self.labels.push(label);
        self.colors.push(rank_color(rank));
        id
    }

    pub fn num_links(&self) -> usize {
        self.values.len()
    }
}

/// Count adjacent-rank transitions over all lineages, down to (and
/// including) `deepest`. Links at each rank are ordered by weight so the
/// heaviest flows render first.
pub fn build_sankey(lineages: &[Lineage], deepest: Rank) -> SankeyDiagram {
    let mut diagram = SankeyDiagram::default();
    let mut node_ids: HashMap<String, usize> = HashMap::new();

    for pos in 0..deepest.index() {
        let parent = Rank::ALL[pos];
        let child = Rank::ALL[pos + 1];

        let mut counts: HashMap<(String, String), usize> = HashMap::new();
        for lineage in lineages {
            if let (Some(from), Some(to)) = (lineage.token_at(parent), lineage.token_at(child)) {
                *counts.entry((from, to)).or_insert(0) += 1;
            }
        }

        let mut pairs: Vec<((String, String), usize)> = counts.into_iter().collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        for ((from, to), count) in pairs {
            let source = diagram.node(&mut node_ids, from, parent);
            let target = diagram.node(&mut node_ids, to, child);
            diagram.sources.push(source);
            diagram.targets.push(target);
            diagram.values.push(count);
        }
    }

    diagram
}

/// Write the diagram as a self-contained HTML page carrying a plotly.js
/// Sankey trace.
pub fn write_sankey_html(diagram: &SankeyDiagram, title: &str, output: &Path) -> Result<()> {
    let data = serde_json::json!([{
        "type": "sankey",
        "node": {
            "pad": 15,
            "thickness": 20,
            "line": {"color": "black", "width": 0.5},
            "label": diagram.labels,
            "color": diagram.colors,
        },
        "link": {
            "source": diagram.sources,
            "target": diagram.targets,
            "value": diagram.values,
        },
    }]);
    let layout = serde_json::json!({
        "title": {"text": title},
        "font": {"size": 10},
        "width": 1600,
        "height": 900,
    });

    let html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <script src=\"https://cdn.plot.ly/plotly-2.27.0.min.js\"></script>\n\
         </head>\n<body>\n<div id=\"sankey\"></div>\n\
         <script>\nPlotly.newPlot(\"sankey\", {}, {});\n</script>\n</body>\n</html>\n",
        data, layout
    );

    std::fs::write(output, html)
        .with_context(|| format!("failed to write sankey to {}", output.display()))?;
    Ok(())
}
