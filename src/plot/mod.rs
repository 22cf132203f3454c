//! Chart rendering for exported reports.

mod charts;

pub use charts::{
    render_components_chart, render_correlation_chart, render_forecast_chart, render_trend_chart,
    render_top_clients_chart,
};
