use crate::changelog::hms;
use color_eyre::eyre::{bail, ContextCompat, Result, WrapErr};
use url::Url;

/// Twitch style `1h2m3s` offset.
fn twitch_offset(seconds: f64) -> String {
	let (hrs, mins, secs) = hms(seconds.round());
	let secs = secs as u64;
	if hrs > 0 {
		format!("{hrs}h{mins}m{secs}s")
	} else if mins > 0 {
		format!("{mins}m{secs}s")
	} else {
		format!("{secs}s")
	}
}

/// Links to the VOD at `seconds`, keeping any query parameters already there.
pub fn url_at_time(vod: &str, seconds: f64) -> Result<String> {
	let mut url = Url::parse(vod).wrap_err_with(|| format!("invalid vod url {vod}"))?;
	let host = url
		.host_str()
		.wrap_err_with(|| format!("no domain found for url {vod}"))?
		.to_owned();
	let offset = if host.contains("twitch.tv") {
		twitch_offset(seconds)
	} else if host.contains("youtube.com") || host.contains("youtu.be") {
		format!("{}", seconds.trunc() as u64)
	} else {
		bail!("unexpected domain {host} for url {vod}");
	};
	url.query_pairs_mut().append_pair("t", &offset);
	Ok(url.into())
}
