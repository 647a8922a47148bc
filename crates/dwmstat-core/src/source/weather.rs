use crate::buffer::FragmentBuffer;
use crate::fmt::{normalize_for_display, truncate_bytes};
use crate::manifest::{WeatherConfig, WeatherFormat};

use super::{RefreshContext, SourceError};

/// Remote weather text.
///
/// Any failure leaves the previous fragment on display: a flaky network
/// should not blank a value that changes once an hour anyway.
#[derive(Debug)]
pub struct WeatherSource {
    config: WeatherConfig,
}

impl WeatherSource {
    pub fn new(config: WeatherConfig) -> Self {
        Self { config }
    }

    pub fn refresh(
        &mut self,
        ctx: &RefreshContext<'_>,
        buf: &mut FragmentBuffer,
    ) -> Result<(), SourceError> {
        let body = ctx.http.get(&self.config.url, self.config.timeout)?;
        let text = render_weather(&body, self.config.format, self.config.max_len)
            .ok_or(SourceError::Unusable("unusable weather response"))?;
        buf.append(format_args!("[{}]", text));
        Ok(())
    }
}

/// Turns a response body into the text shown inside the brackets.
///
/// Returns `None` for bodies that are empty or look like an HTML page.
pub fn render_weather(body: &str, format: WeatherFormat, max_len: usize) -> Option<String> {
    let flat = normalize_for_display(body);
    if flat.is_empty() || flat.starts_with('<') {
        return None;
    }

    let text = match format {
        WeatherFormat::Raw => flat,
        WeatherFormat::IconTemp => extract_icon_temp(body).unwrap_or(flat),
    };

    let text = truncate_bytes(&text, max_len).trim_end();
    (!text.is_empty()).then(|| text.to_string())
}

/// Pulls `icon temp` out of a `Place: icon +12°C` style line.
///
/// The place prefix is optional. Returns `None` when no token looks like a
/// temperature.
pub fn extract_icon_temp(body: &str) -> Option<String> {
    let line = body.lines().map(str::trim).find(|l| !l.is_empty())?;
    let rest = line.split_once(':').map_or(line, |(_, rest)| rest);

    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let temp = tokens.iter().copied().find(|t| is_temperature(t))?;
    let icon = tokens.iter().copied().find(|t| *t != temp);

    Some(match icon {
        Some(icon) => format!("{} {}", icon, temp),
        None => temp.to_string(),
    })
}

fn is_temperature(token: &str) -> bool {
    let unitless = token
        .strip_suffix('C')
        .or_else(|| token.strip_suffix('F'))
        .map(|t| t.trim_end_matches('°'));
    let Some(number) = unitless else {
        return false;
    };
    let number = number.strip_prefix(['+', '-']).unwrap_or(number);
    !number.is_empty() && number.chars().all(|c| c.is_ascii_digit() || c == '.')
}
