use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use hpfold::experiment::Thresholds;
use hpfold::stats::{LengthSummary, TrendResult};

fn pct_cell(rate: f64) -> Cell {
    Cell::new(format!("{:.1}%", rate * 100.0))
}

fn ci_cell(ci: (f64, f64)) -> Cell {
    Cell::new(format!("[{:.1}, {:.1}]", ci.0 * 100.0, ci.1 * 100.0))
}

fn p_cell(p: f64) -> Cell {
    let text = if p < 1e-4 {
        format!("{:.1e}", p)
    } else {
        format!("{:.4}", p)
    };
    if p < 0.05 {
        Cell::new(text).fg(Color::Green)
    } else {
        Cell::new(text)
    }
}

pub fn print_thresholds(thresholds: &Thresholds) {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    table.add_row(vec![
        Cell::new("L").add_attribute(Attribute::Bold),
        Cell::new("E* (locked)").add_attribute(Attribute::Bold),
    ]);
    if let Some(col) = table.column_mut(1) {
        col.set_cell_alignment(CellAlignment::Right);
    }

    for (length, e_star) in thresholds {
        table.add_row(vec![Cell::new(length), Cell::new(format!("{:.0}", e_star))]);
    }
    println!("\n{}", table);
}

pub fn print_scaling_report(rows: &[LengthSummary]) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("L").add_attribute(Attribute::Bold),
        Cell::new("MC"),
        Cell::new("MC 95% CI"),
        Cell::new("FE").fg(Color::Cyan),
        Cell::new("FE 95% CI").fg(Color::Cyan),
        Cell::new("Δ (pp)").add_attribute(Attribute::Bold),
        Cell::new("Ratio"),
        Cell::new("d"),
        Cell::new("MW p"),
        Cell::new("MC <E>"),
        Cell::new("FE <E>"),
    ]);

    for i in 1..=10 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    for s in rows {
        let delta_pp = s.delta * 100.0;
        let delta_cell = Cell::new(format!("{:+.1}", delta_pp)).add_attribute(Attribute::Bold);
        let delta_cell = if delta_pp > 0.0 {
            delta_cell.fg(Color::Green)
        } else if delta_pp < 0.0 {
            delta_cell.fg(Color::Red)
        } else {
            delta_cell
        };

        table.add_row(vec![
            Cell::new(s.length).add_attribute(Attribute::Bold),
            pct_cell(s.baseline.rate),
            ci_cell(s.baseline.ci_95),
            pct_cell(s.challenger.rate).fg(Color::Cyan),
            ci_cell(s.challenger.ci_95).fg(Color::Cyan),
            delta_cell,
            Cell::new(match s.ratio {
                Some(r) => format!("{:.2}x", r),
                None => "inf".to_string(),
            }),
            Cell::new(format!("{:.3}", s.cohens_d)),
            p_cell(s.mann_whitney_p),
            Cell::new(format!("{:.2}", s.baseline.mean_energy)),
            Cell::new(format!("{:.2}", s.challenger.mean_energy)),
        ]);
    }
    println!("\n{}", table);
}

pub fn print_trend_report(trend: &TrendResult) {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    table.add_row(vec![
        Cell::new("Scaling trend Δ(L) = a + b·L").add_attribute(Attribute::Bold),
        Cell::new("Value"),
    ]);
    if let Some(col) = table.column_mut(1) {
        col.set_cell_alignment(CellAlignment::Right);
    }

    if !trend.sufficient_data {
        table.add_row(vec![Cell::new("Status"), Cell::new(&trend.interpretation).fg(Color::Yellow)]);
        println!("\n{}", table);
        return;
    }

    table.add_row(vec![Cell::new("b (pp per residue)"), Cell::new(format!("{:.4}", trend.slope_b))]);
    table.add_row(vec![Cell::new("a (pp)"), Cell::new(format!("{:.2}", trend.intercept_a))]);
    table.add_row(vec![Cell::new("R²"), Cell::new(format!("{:.3}", trend.r_squared))]);
    table.add_row(vec![Cell::new("SE(b)"), Cell::new(format!("{:.4}", trend.std_err))]);
    table.add_row(vec![Cell::new("p (OLS, two-sided)"), p_cell(trend.p_ols)]);
    table.add_row(vec![
        Cell::new(format!("p (permutation, n={})", trend.n_permutations)),
        p_cell(trend.p_permutation_one_sided),
    ]);

    let verdict = if trend.is_significant(0.05) {
        Cell::new("advantage grows with L").fg(Color::Green)
    } else {
        Cell::new("no significant growth").fg(Color::Yellow)
    };
    table.add_row(vec![Cell::new("Verdict").add_attribute(Attribute::Bold), verdict]);
    println!("\n{}", table);
}
