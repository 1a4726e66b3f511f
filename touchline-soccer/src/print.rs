use stanza::style::HAlign::Left;
use stanza::style::{HAlign, Header, MinWidth, Styles};
use stanza::table::{Cell, Col, Row, Table};

use crate::context::Adjustments;
use crate::domain::ThreeWay;
use crate::forecast::ForecastResult;

fn label_col(width: usize) -> Col {
    Col::new(Styles::default().with(MinWidth(width)).with(Left))
}

fn number_col(width: usize) -> Col {
    Col::new(Styles::default().with(MinWidth(width)).with(HAlign::Right))
}

fn header(labels: &[&str]) -> Row {
    Row::new(
        Styles::default().with(Header(true)),
        labels.iter().map(|label| label.to_string().into()).collect(),
    )
}

fn percent_cell(value: Option<f64>) -> Cell {
    match value {
        Some(value) => format!("{value:.2}").into(),
        None => "-".into(),
    }
}

pub fn tabulate_three_way(result: &ForecastResult) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            label_col(10),
            number_col(8),
            number_col(8),
            number_col(8),
            number_col(8),
            number_col(8),
        ])
        .with_row(header(&["Outcome", "Forecast", "Price", "Grid", "Rating", "Market"]));
    let components = &result.components;
    let as_percent = |three_way: &ThreeWay| three_way.scale(100.0).to_array();
    let grid = as_percent(&components.grid);
    let rating = as_percent(&components.rating);
    let market = components.market.as_ref().map(as_percent);
    for (index, (label, forecast, price)) in [
        ("Home", result.three_way.home, result.fair_prices.home),
        ("Draw", result.three_way.draw, result.fair_prices.draw),
        ("Away", result.three_way.away, result.fair_prices.away),
    ]
    .into_iter()
    .enumerate()
    {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                label.into(),
                format!("{forecast:.2}").into(),
                format!("{price:.2}").into(),
                format!("{:.2}", grid[index]).into(),
                format!("{:.2}", rating[index]).into(),
                percent_cell(market.map(|market| market[index])),
            ],
        ));
    }
    table
}

pub fn tabulate_goal_markets(result: &ForecastResult) -> Table {
    let mut table = Table::default()
        .with_cols(vec![label_col(16), number_col(8), number_col(8)])
        .with_row(header(&["Market", "Yes/Over", "No/Under"]));
    for total in &result.totals {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                format!("Goals {:.1}", total.line).into(),
                format!("{:.2}", total.over).into(),
                format!("{:.2}", total.under).into(),
            ],
        ));
    }
    table.push_row(Row::new(
        Styles::default(),
        vec![
            "Both teams score".into(),
            format!("{:.2}", result.btts).into(),
            format!("{:.2}", 100.0 - result.btts).into(),
        ],
    ));
    let double_chance = &result.double_chance;
    for (label, value) in [
        ("Home or draw", double_chance.home_or_draw),
        ("Home or away", double_chance.home_or_away),
        ("Draw or away", double_chance.draw_or_away),
    ] {
        table.push_row(Row::new(
            Styles::default(),
            vec![label.into(), format!("{value:.2}").into(), "".into()],
        ));
    }
    table.push_row(Row::new(
        Styles::default(),
        vec![
            "Draw no bet".into(),
            format!("{:.2}", result.draw_no_bet.home).into(),
            format!("{:.2}", result.draw_no_bet.away).into(),
        ],
    ));
    table
}

pub fn tabulate_correct_scores(result: &ForecastResult) -> Table {
    let mut table = Table::default()
        .with_cols(vec![label_col(6), number_col(8)])
        .with_row(header(&["Score", "Prob"]));
    for score in &result.top_scores {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                score.score.to_string().into(),
                format!("{:.2}", score.probability).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_handicaps(result: &ForecastResult) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            label_col(6),
            number_col(7),
            number_col(7),
            number_col(7),
            number_col(8),
        ])
        .with_row(header(&["Line", "Win", "Push", "Lose", "Settled"]));
    for line in &result.asian_handicaps {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                format!("{:+.2}", line.line).into(),
                format!("{:.2}", line.win).into(),
                format!("{:.2}", line.push).into(),
                format!("{:.2}", line.lose).into(),
                format!("{:.2}", line.settled).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_summary(result: &ForecastResult) -> Table {
    let mut table = Table::default().with_cols(vec![label_col(16), number_col(12)]);
    let mut push = |label: &str, value: String| {
        table.push_row(Row::new(Styles::default(), vec![label.to_string().into(), value.into()]));
    };
    push(
        "Expected goals",
        format!("{:.2}-{:.2}", result.expected_goals.home, result.expected_goals.away),
    );
    push(
        "Correct score",
        format!("{} ({:.2})", result.correct_score.score, result.correct_score.probability),
    );
    push("Penalty", format!("{:.2}", result.penalty_probability));
    match &result.recommendation {
        Some(recommendation) => {
            push("Selection", recommendation.selection.to_string());
            push(
                "Price",
                recommendation
                    .price
                    .map_or_else(|| "-".to_string(), |price| format!("{price:.2}")),
            );
            push("Edge", format!("{:.3}", recommendation.edge));
            push("Kelly", format!("{:.4}", recommendation.kelly));
            push("Value", recommendation.is_value.to_string());
        }
        None => push("Selection", "-".to_string()),
    }
    if let Some(overround) = result.market_overround {
        push("Overround", format!("{overround:.3}"));
    }
    push("Confidence", result.confidence.to_string());
    table
}

pub fn tabulate_adjustments(adjustments: &Adjustments) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            label_col(12),
            number_col(8),
            number_col(8),
            number_col(8),
            number_col(8),
            label_col(20),
        ])
        .with_row(header(&["Factor", "H.att", "H.def", "A.att", "A.def", "Detail"]));
    for applied in &adjustments.applied {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                applied.name.clone().into(),
                format!("{:.3}", applied.home.attack).into(),
                format!("{:.3}", applied.home.defense).into(),
                format!("{:.3}", applied.away.attack).into(),
                format!("{:.3}", applied.away.defense).into(),
                applied.detail.clone().into(),
            ],
        ));
    }
    if adjustments.draw_boost > 0.0 {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                "draw boost".into(),
                "".into(),
                "".into(),
                "".into(),
                "".into(),
                format!("+{:.1} pp", adjustments.draw_boost).into(),
            ],
        ));
    }
    table
}
