//! FFmpeg encoder sink
//!
//! Raw frames are written to the stdin of an `ffmpeg` process, which muxes
//! them into the configured container. Closing stdin tells FFmpeg to write
//! the trailer; waiting on the process makes the file complete.

use super::types::{FrameSink, SinkFactory, SinkSpec, VideoContainer};
use crate::capture::{Frame, PixelFormat};
use crate::recorder::error::{RecordingError, RecordingResult};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Pixel layout fed to FFmpeg. Captures already arrive as RGBA, so the
/// capture loop only converts frames from sources that produce BGRA.
const INPUT_PIXEL_FORMAT: PixelFormat = PixelFormat::Rgba;

/// Build the FFmpeg command line for a sink
pub fn encoder_args(spec: &SinkSpec) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-nostats".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        INPUT_PIXEL_FORMAT.ffmpeg_name().to_string(),
        "-s".to_string(),
        spec.resolution.to_string(),
        "-r".to_string(),
        spec.fps.to_string(),
        "-i".to_string(),
        "-".to_string(), // stdin for video frames
    ];

    match spec.container {
        VideoContainer::Avi => {
            args.extend([
                "-c:v".to_string(),
                spec.container.video_codec().to_string(),
                "-vtag".to_string(),
                "XVID".to_string(),
                "-q:v".to_string(),
                "5".to_string(),
                "-pix_fmt".to_string(),
                "yuv420p".to_string(),
            ]);
        }
        VideoContainer::Mp4 => {
            args.extend([
                "-c:v".to_string(),
                spec.container.video_codec().to_string(),
                "-preset".to_string(),
                "veryfast".to_string(),
                "-crf".to_string(),
                "23".to_string(),
                "-pix_fmt".to_string(),
                "yuv420p".to_string(),
                "-movflags".to_string(),
                "+faststart".to_string(),
            ]);
        }
    }

    args.push(spec.path.to_string_lossy().to_string());
    args
}

/// Opens [`FfmpegSink`]s using the given FFmpeg binary
#[derive(Debug, Clone)]
pub struct FfmpegSinkFactory {
    binary: PathBuf,
}

impl FfmpegSinkFactory {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfmpegSinkFactory {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl SinkFactory for FfmpegSinkFactory {
    fn open_sink(&self, spec: &SinkSpec) -> RecordingResult<Box<dyn FrameSink>> {
        Ok(Box::new(FfmpegSink::open(&self.binary, spec.clone())?))
    }
}

/// How long `open` watches a fresh FFmpeg process for a startup failure
const STARTUP_CHECK: Duration = Duration::from_millis(250);
const STARTUP_POLL: Duration = Duration::from_millis(10);

/// Poll `process` until it exits or `window` passes
fn wait_for_early_exit(process: &mut Child, window: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + window;
    loop {
        if let Some(status) = process.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(STARTUP_POLL);
    }
}

/// Collect FFmpeg's stderr on a thread so a chatty encoder never fills the pipe
fn drain_stderr(process: &mut Child) -> RecordingResult<JoinHandle<String>> {
    let mut pipe = process
        .stderr
        .take()
        .ok_or_else(|| RecordingError::EncodingError("Failed to capture FFmpeg stderr".to_string()))?;

    let handle = thread::Builder::new()
        .name("ffmpeg-stderr".to_string())
        .spawn(move || {
            let mut output = String::new();
            let _ = pipe.read_to_string(&mut output);
            output
        })?;
    Ok(handle)
}

fn collect_stderr(reader: Option<JoinHandle<String>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .map(|output| output.trim().to_string())
        .unwrap_or_default()
}

/// One FFmpeg encoding process
pub struct FfmpegSink {
    process: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<String>>,
    spec: SinkSpec,
    frame_count: u64,
}

impl FfmpegSink {
    /// Start FFmpeg for `spec`.
    ///
    /// Waits briefly so that a bad codec, output path or binary is reported
    /// here rather than as a broken pipe on the first frame.
    pub fn open(binary: &Path, spec: SinkSpec) -> RecordingResult<Self> {
        let resolution = spec.resolution;
        // yuv420p output needs even dimensions
        if resolution.is_empty() || resolution.width % 2 != 0 || resolution.height % 2 != 0 {
            return Err(RecordingError::EncodingError(format!(
                "Unsupported frame size {} (width and height must be even and non-zero)",
                resolution
            )));
        }
        if !spec.fps.is_finite() || spec.fps <= 0.0 {
            return Err(RecordingError::EncodingError(format!(
                "Unsupported frame rate {}",
                spec.fps
            )));
        }

        let args = encoder_args(&spec);
        tracing::info!("Starting FFmpeg encoder: {:?}", args);

        let mut process = Command::new(binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RecordingError::EncodingError(format!("Failed to start FFmpeg encoder: {}", e)))?;

        let stderr = drain_stderr(&mut process)?;

        if let Some(status) = wait_for_early_exit(&mut process, STARTUP_CHECK)? {
            let message = collect_stderr(Some(stderr));
            tracing::error!("FFmpeg exited during startup ({}): {}", status, message);
            return Err(RecordingError::EncodingError(format!(
                "FFmpeg exited immediately ({}): {}",
                status, message
            )));
        }

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| RecordingError::EncodingError("Failed to capture FFmpeg stdin".to_string()))?;

        tracing::info!(
            "Started FFmpeg encoder: {} @ {}fps, output: {:?}",
            resolution,
            spec.fps,
            spec.path
        );

        Ok(Self {
            process: Some(process),
            stdin: Some(stdin),
            stderr: Some(stderr),
            spec,
            frame_count: 0,
        })
    }
}

impl FrameSink for FfmpegSink {
    fn pixel_format(&self) -> PixelFormat {
        INPUT_PIXEL_FORMAT
    }

    fn append_frame(&mut self, frame: &Frame) -> RecordingResult<()> {
        if frame.resolution() != self.spec.resolution || frame.format != INPUT_PIXEL_FORMAT {
            return Err(RecordingError::EncodingError(format!(
                "Frame {} {:?} does not match encoder {} {:?}",
                frame.resolution(),
                frame.format,
                self.spec.resolution,
                INPUT_PIXEL_FORMAT
            )));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| RecordingError::EncodingError("Encoder already closed".to_string()))?;

        stdin
            .write_all(&frame.data)
            .map_err(|e| RecordingError::EncodingError(format!("Failed to write frame: {}", e)))?;
        self.frame_count += 1;
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frame_count
    }

    /// Finalize the file.
    ///
    /// A stream that never received a frame is not a playable file: it is
    /// removed and reported as an error.
    fn close(&mut self) -> RecordingResult<()> {
        let Some(mut process) = self.process.take() else {
            return Ok(());
        };

        // Close stdin to signal EOF to FFmpeg
        drop(self.stdin.take());

        let status = process
            .wait()
            .map_err(|e| RecordingError::EncodingError(format!("Failed to wait for FFmpeg: {}", e)))?;
        let stderr = collect_stderr(self.stderr.take());

        if self.frame_count == 0 {
            if let Err(e) = std::fs::remove_file(&self.spec.path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove empty recording {:?}: {}", self.spec.path, e);
                }
            }
            return Err(RecordingError::EncodingError(
                "No frames were written; the empty recording was discarded".to_string(),
            ));
        }

        if !status.success() {
            return Err(RecordingError::EncodingError(format!(
                "FFmpeg exited with error ({}): {}",
                status, stderr
            )));
        }

        tracing::info!(
            "FFmpeg encoder finished: {} frames written to {:?}",
            self.frame_count,
            self.spec.path
        );
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Failed to finalize {:?}: {}", self.spec.path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Resolution;
    use tempfile::tempdir;

    fn spec(path: PathBuf, container: VideoContainer) -> SinkSpec {
        SinkSpec {
            path,
            resolution: Resolution::new(64, 48),
            fps: 15.0,
            container,
        }
    }

    fn frame(shade: u8) -> Frame {
        Frame::new(64, 48, PixelFormat::Rgba, [shade, shade, shade, 255].repeat(64 * 48)).unwrap()
    }

    fn tool_available(name: &str) -> bool {
        Command::new(name)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Count decodable video frames in `path` with ffprobe
    fn count_decoded_frames(path: &Path) -> Option<u64> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-count_frames",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=nb_read_frames",
                "-of",
                "csv=p=0",
            ])
            .arg(path)
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        String::from_utf8_lossy(&output.stdout).trim().parse().ok()
    }

    /// Write an executable shell script standing in for the ffmpeg binary
    #[cfg(unix)]
    fn stub_encoder(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("ffmpeg-stub.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_avi_args() {
        let args = encoder_args(&spec(PathBuf::from("out/recording.avi"), VideoContainer::Avi));
        let joined = args.join(" ");

        assert!(joined.contains("-f rawvideo -pix_fmt rgba -s 64x48 -r 15 -i -"));
        assert!(joined.contains("-c:v mpeg4 -vtag XVID"));
        assert_eq!(args.last().unwrap(), "out/recording.avi");
    }

    #[test]
    fn test_mp4_args() {
        let args = encoder_args(&spec(PathBuf::from("clip.mp4"), VideoContainer::Mp4));
        let joined = args.join(" ");

        assert!(joined.contains("-c:v libx264"));
        assert!(joined.contains("-movflags +faststart"));
        assert!(!joined.contains("XVID"));
    }

    #[test]
    fn test_odd_size_rejected() {
        let mut odd = spec(PathBuf::from("x.avi"), VideoContainer::Avi);
        odd.resolution = Resolution::new(641, 480);
        assert!(matches!(
            FfmpegSink::open(Path::new("ffmpeg"), odd),
            Err(RecordingError::EncodingError(_))
        ));
    }

    #[test]
    fn test_missing_binary_is_setup_error() {
        let dir = tempdir().unwrap();
        let factory = FfmpegSinkFactory::new(dir.path().join("no-such-ffmpeg"));
        let result = factory.open_sink(&spec(dir.path().join("x.avi"), VideoContainer::Avi));
        assert!(matches!(result, Err(RecordingError::EncodingError(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_encoder_failing_at_startup_is_open_error() {
        let dir = tempdir().unwrap();
        let binary = stub_encoder(dir.path(), "echo \"Unknown encoder 'mpeg4'\" >&2\nexit 1");
        let factory = FfmpegSinkFactory::new(&binary);

        for _ in 0..5 {
            match factory.open_sink(&spec(dir.path().join("x.avi"), VideoContainer::Avi)) {
                Err(RecordingError::EncodingError(message)) => {
                    assert!(message.contains("Unknown encoder"), "{}", message)
                }
                Err(e) => panic!("unexpected error: {}", e),
                Ok(_) => panic!("open succeeded against an encoder that exits at startup"),
            }
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_verbose_encoder_does_not_block_writes() {
        let dir = tempdir().unwrap();
        // Far more stderr than a pipe buffer holds, then consume stdin
        let binary = stub_encoder(dir.path(), "head -c 1048576 /dev/zero >&2\ncat > /dev/null");
        let mut sink = FfmpegSinkFactory::new(&binary)
            .open_sink(&spec(dir.path().join("x.avi"), VideoContainer::Avi))
            .unwrap();

        for shade in 0..20u8 {
            sink.append_frame(&frame(shade)).unwrap();
        }
        sink.close().unwrap();
        assert_eq!(sink.frames_written(), 20);
    }

    #[cfg(unix)]
    #[test]
    fn test_zero_frame_stream_is_discarded() {
        let dir = tempdir().unwrap();
        // Create the output file like FFmpeg does, then wait for EOF
        let binary = stub_encoder(dir.path(), "for arg; do out=\"$arg\"; done\n: > \"$out\"\ncat > /dev/null");
        let path = dir.path().join("recording_empty.avi");
        let mut sink = FfmpegSinkFactory::new(&binary)
            .open_sink(&spec(path.clone(), VideoContainer::Avi))
            .unwrap();
        assert!(path.exists());

        assert!(matches!(sink.close(), Err(RecordingError::EncodingError(_))));
        assert!(!path.exists());
        // Already closed
        sink.close().unwrap();
    }

    #[test]
    fn test_writes_playable_file() {
        if !tool_available("ffmpeg") {
            eprintln!("ffmpeg not on PATH, skipping");
            return;
        }

        let dir = tempdir().unwrap();
        let path = dir.path().join("recording_test.avi");
        let mut sink = FfmpegSinkFactory::default()
            .open_sink(&spec(path.clone(), VideoContainer::Avi))
            .unwrap();

        for shade in [0u8, 128, 255] {
            sink.append_frame(&frame(shade)).unwrap();
        }
        sink.close().unwrap();
        // Second close is a no-op
        sink.close().unwrap();

        assert_eq!(sink.frames_written(), 3);
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        if tool_available("ffprobe") {
            assert_eq!(count_decoded_frames(&path), Some(3));
        }
    }

    #[test]
    fn test_single_frame_file_is_playable() {
        if !tool_available("ffmpeg") || !tool_available("ffprobe") {
            eprintln!("ffmpeg/ffprobe not on PATH, skipping");
            return;
        }

        let dir = tempdir().unwrap();
        let path = dir.path().join("recording_single.avi");
        let mut sink = FfmpegSinkFactory::default()
            .open_sink(&spec(path.clone(), VideoContainer::Avi))
            .unwrap();

        sink.append_frame(&frame(200)).unwrap();
        sink.close().unwrap();

        assert_eq!(count_decoded_frames(&path), Some(1));
    }

    #[test]
    fn test_empty_session_leaves_no_file() {
        if !tool_available("ffmpeg") {
            eprintln!("ffmpeg not on PATH, skipping");
            return;
        }

        let dir = tempdir().unwrap();
        let path = dir.path().join("recording_empty.avi");
        let mut sink = FfmpegSinkFactory::default()
            .open_sink(&spec(path.clone(), VideoContainer::Avi))
            .unwrap();

        assert!(sink.close().is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_wrong_frame_size_rejected() {
        if !tool_available("ffmpeg") {
            return;
        }

        let dir = tempdir().unwrap();
        let mut sink = FfmpegSinkFactory::default()
            .open_sink(&spec(dir.path().join("x.avi"), VideoContainer::Avi))
            .unwrap();

        let small = Frame::new(32, 24, PixelFormat::Rgba, vec![0; 32 * 24 * 4]).unwrap();
        assert!(sink.append_frame(&small).is_err());
        assert_eq!(sink.frames_written(), 0);
    }
}
