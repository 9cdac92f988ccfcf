/// JS side of the audio bridge.
///
/// The engine only *observes* playback; the element itself lives in the
/// DOM. This script rebinds listeners whenever the view swaps the element
/// (section change) and streams events back as small `kind:value` strings.
pub(super) const AUDIO_BRIDGE_SCRIPT: &str = r#"(function() {
    const bind = () => {
        const audio = document.getElementById("attempt-audio");
        if (!audio || audio.dataset.bridged === "1") {
            return;
        }
        audio.dataset.bridged = "1";
        audio.addEventListener("timeupdate", () => {
            dioxus.send("position:" + audio.currentTime);
        });
        audio.addEventListener("loadedmetadata", () => {
            dioxus.send("duration:" + audio.duration);
        });
        audio.addEventListener("ended", () => {
            dioxus.send("ended");
        });
        audio.addEventListener("error", () => {
            dioxus.send("failed");
        });
    };
    bind();
    setInterval(bind, 500);
})();"#;

pub(super) fn play_script() -> String {
    r#"(function() {
        const audio = document.getElementById("attempt-audio");
        if (audio) { audio.play(); }
    })();"#
        .to_string()
}

pub(super) fn pause_script() -> String {
    r#"(function() {
        const audio = document.getElementById("attempt-audio");
        if (audio) { audio.pause(); }
    })();"#
        .to_string()
}

pub(super) fn seek_script(seconds: f64) -> String {
    format!(
        r#"(function() {{
        const audio = document.getElementById("attempt-audio");
        if (audio) {{ audio.currentTime = {seconds}; }}
    }})();"#
    )
}
