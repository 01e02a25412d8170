use rtmp_filter::models::{PlaylistRecord, Provider, ScopeId};
use rtmp_filter::playlist::{MemoizedPlaylistLookup, NoPlaylists, PlaylistLookup};
use rtmp_filter::resolver::{resolve, StreamUrlResolver};
use std::cell::Cell;

fn my_list(scope: ScopeId, name: &str) -> Option<PlaylistRecord> {
    (scope == 1 && name == "MyList").then(|| PlaylistRecord {
        id: 10,
        scope,
        name: name.to_string(),
        list: "a.mp4,Title A\nb.mp4".to_string(),
    })
}

#[test]
fn test_href_without_rtmp_prefix_is_absent() {
    for href in [
        "http://host/app/video.mp4",
        "https://host/app/video.mp4",
        "//host/app/video.mp4",
        "video.mp4",
        "rtmpx://host/app/video.mp4",
    ] {
        assert!(resolve(href, false, 1, &NoPlaylists).is_none(), "{href}");
    }
}

#[test]
fn test_single_clip() {
    let result = resolve("rtmp://host/app/video.mp4", false, 1, &NoPlaylists).unwrap();
    assert_eq!(result.clips.len(), 1);
    assert_eq!(result.clips[0].connection_url, "rtmp://host/app");
    assert_eq!(result.clips[0].stream_path, "mp4:video");
    assert_eq!((result.width, result.height), (0, 0));
    assert!(!result.has_dimensions());
}

#[test]
fn test_two_alternatives() {
    let result = resolve(
        "rtmp://host/app/video.mp4#rtmp://host/app/video2.mp4",
        false,
        1,
        &NoPlaylists,
    )
    .unwrap();
    assert_eq!(result.clips.len(), 2);
    assert_eq!(result.clips[0].index, 0);
    assert_eq!(result.clips[1].index, 1);
    assert_eq!(result.clips[1].stream_path, "mp4:video2");
}

#[test]
fn test_size_directive_on_audio_clip() {
    let result = resolve("rtmp://host/app/clip.mp3?d=640x480", false, 1, &NoPlaylists).unwrap();
    assert_eq!((result.width, result.height), (640, 480));
    assert_eq!(result.clips[0].stream_path, "mp3:clip");
    assert!(!result.clips[0].stream_path.contains("d="));
    assert!(!result.clips[0].source_url.contains("d="));
}

#[test]
fn test_playlist_reference() {
    let result = resolve("rtmp://playlist=MyList", false, 1, &my_list).unwrap();
    let titles: Vec<_> = result.clips.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, ["Title A", "b"]);
    assert!(result.suppress_fallback_link);
}

#[test]
fn test_missing_playlist_is_absent() {
    assert!(resolve("rtmp://playlist=Missing", false, 1, &my_list).is_none());
}

#[test]
fn test_resolved_path_does_not_double_prefix() {
    for href in [
        "rtmp://host/app/video.mp4",
        "rtmp://host/app/talk.f4v",
        "rtmp://host/app/clip.mp3",
        "rtmp://host/app/old.flv",
    ] {
        let first = resolve(href, false, 1, &NoPlaylists).unwrap();
        let clip = &first.clips[0];
        let again = resolve(
            &format!("{}/{}", clip.connection_url, clip.stream_path),
            false,
            1,
            &NoPlaylists,
        )
        .unwrap();
        assert_eq!(again.clips[0].stream_path, clip.stream_path, "{href}");
        assert!(!again.clips[0].stream_path.contains("mp4:mp4:"));
        assert!(!again.clips[0].stream_path.contains("mp3:mp3:"));
    }
}

#[test]
fn test_provider_segment_counts() {
    let standard = resolve("rtmp://host/a/b/c.flv", false, 1, &NoPlaylists).unwrap();
    assert_eq!(standard.clips[0].connection_url, "rtmp://host/a");
    assert_eq!(standard.clips[0].stream_path, "b/c");
    assert_eq!(standard.clips[0].provider, Provider::Standard);

    let acf = resolve("rtmp://host/a/b/c.flv?provider=acf", false, 1, &NoPlaylists).unwrap();
    assert_eq!(acf.clips[0].connection_url, "rtmp://host/a/b");
    assert_eq!(acf.clips[0].stream_path, "c");
    assert_eq!(acf.clips[0].provider, Provider::Acf);
}

#[test]
fn test_repeated_playlist_is_looked_up_once_per_batch() {
    let calls = Cell::new(0);
    let counting = |scope: ScopeId, name: &str| {
        calls.set(calls.get() + 1);
        my_list(scope, name)
    };
    let lookup = MemoizedPlaylistLookup::new(counting);
    let resolver = StreamUrlResolver::new(1, false, &lookup);

    for _ in 0..4 {
        assert!(resolver.resolve("rtmp://playlist=MyList").is_some());
        assert!(resolver.resolve("rtmp://playlist=Missing").is_none());
    }
    assert_eq!(calls.get(), 2);
    assert!(lookup.find_playlist(1, "MyList").is_some());
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_stream_key_is_not_percent_encoded() {
    let result = resolve("rtmp://host/app/vidéo.mp4", false, 1, &NoPlaylists).unwrap();
    assert_eq!(result.clips[0].stream_path, "mp4:vidéo");

    let result = resolve("rtmp://host/app/my clip.mp4", false, 1, &NoPlaylists).unwrap();
    assert_eq!(result.clips[0].stream_path, "mp4:my clip");

    let result = resolve(
        "rtmp://host/app/v.mp4?a=&lt;x&gt;&amp;b=c d",
        false,
        1,
        &NoPlaylists,
    )
    .unwrap();
    assert_eq!(result.clips[0].stream_path, "mp4:v?a=<x>&b=c d");
}

#[test]
fn test_upper_case_directives() {
    let result = resolve("rtmp://host/app/clip.mp3?D=640x480", false, 1, &NoPlaylists).unwrap();
    assert_eq!((result.width, result.height), (640, 480));
    assert_eq!(result.clips[0].stream_path, "mp3:clip");

    let result = resolve("rtmp://host/app/clip.mp3?Captions=y", false, 1, &NoPlaylists).unwrap();
    assert!(result.clips[0].captions_enabled);
    assert_eq!(result.clips[0].stream_path, "mp3:clip");
}

#[test]
fn test_directory_href_is_absent() {
    assert!(resolve("rtmp://host/app/dir/", false, 1, &NoPlaylists).is_none());
}
