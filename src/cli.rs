use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use serde::Deserialize;

use crate::bridge::{Bridge, Dispatcher, MethodCall, RequestId, Response, Submitter, Value};
use crate::config::{self, Config, ThumbnailMode};
use crate::core::tagger::LoftyCodec;
use crate::core::thumbnail;
use crate::error::ErrorKind;
use crate::models::{TagField, TagSet};

#[derive(Parser)]
#[command(name = "audio-tagger", about = "오디오 파일 메타데이터 브리지")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 파일의 태그 7개 필드를 표시
    Tags {
        /// 오디오 파일
        file: PathBuf,
    },
    /// 지정한 필드만 기록
    Edit {
        /// 편집할 오디오 파일
        file: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        album: Option<String>,
        #[arg(long)]
        artist: Option<String>,
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        year: Option<String>,
        #[arg(long)]
        disc: Option<String>,
        #[arg(long)]
        track: Option<String>,
    },
    /// 아트워크 추출 또는 교체
    Artwork {
        /// 오디오 파일
        file: PathBuf,
        /// 기록할 이미지 파일
        #[arg(long, conflicts_with = "output")]
        set: Option<PathBuf>,
        /// 추출한 아트워크를 저장할 경로
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// 썸네일 생성
    Thumbnail {
        /// 오디오 파일
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// 이미지를 가운데 기준 정사각형으로 잘라 PNG로 저장
    Crop {
        /// 이미지 파일
        image: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// 표준 입력의 JSON 요청을 한 줄씩 처리하고 표준 출력으로 응답
    Serve,
    /// 설정 표시 및 변경
    Config {
        /// 썸네일 전략 저장
        #[arg(long, value_enum)]
        thumbnail_mode: Option<ThumbnailMode>,
    },
}

pub fn run(cli: Cli, cfg: Config) -> Result<()> {
    match cli.command {
        Commands::Tags { file } => cmd_tags(&build_dispatcher(&cfg), &file),
        Commands::Edit {
            file,
            title,
            album,
            artist,
            genre,
            year,
            disc,
            track,
        } => {
            let tags = TagSet {
                title,
                album,
                artist,
                genre,
                year,
                disc,
                track,
            };
            cmd_edit(&build_dispatcher(&cfg), &file, &tags)
        }
        Commands::Artwork { file, set, output } => {
            let dispatcher = build_dispatcher(&cfg);
            match set {
                Some(image) => cmd_set_artwork(&dispatcher, &file, &image),
                None => cmd_extract_artwork(&dispatcher, &file, output.as_deref()),
            }
        }
        Commands::Thumbnail { file, output } => cmd_bytes(
            &build_dispatcher(&cfg),
            MethodCall::new("extractThumbnail").arg("path", path_arg(&file)),
            &output,
        ),
        Commands::Crop { image, output } => cmd_bytes(
            &build_dispatcher(&cfg),
            MethodCall::new("cropToSquare").arg("path", path_arg(&image)),
            &output,
        ),
        Commands::Serve => cmd_serve(build_dispatcher(&cfg)),
        Commands::Config { thumbnail_mode } => cmd_config(cfg, thumbnail_mode),
    }
}

fn build_dispatcher(cfg: &Config) -> Dispatcher {
    let thumbnailer = thumbnail::select(&cfg.thumbnail);
    Dispatcher::new(Bridge::new(Arc::new(LoftyCodec), thumbnailer))
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// 응답에 실패 정보가 있으면 오류로 바꾼다. 데이터 없음은 실패가 아니다.
fn into_value(response: Response) -> Result<Option<Value>> {
    match response.error {
        None => Ok(Some(response.value)),
        Some(report) if report.kind == ErrorKind::Absent => Ok(None),
        Some(report) => anyhow::bail!("{} ({})", report.message, report.kind),
    }
}

fn cmd_tags(dispatcher: &Dispatcher, file: &Path) -> Result<()> {
    let response = dispatcher.call(MethodCall::new("extractAllTags").arg("path", path_arg(file)));
    let Some(Value::Tags(Some(tags))) = into_value(response)? else {
        anyhow::bail!("태그를 읽을 수 없습니다: {}", file.display());
    };

    let mut table = Table::new();
    table.set_header(vec!["필드", "값"]);
    for field in TagField::ALL {
        table.add_row(vec![
            Cell::new(field.key()),
            Cell::new(tags.get(field).unwrap_or_default()),
        ]);
    }

    println!("{}", file.display());
    println!("{table}");
    Ok(())
}

fn cmd_edit(dispatcher: &Dispatcher, file: &Path, tags: &TagSet) -> Result<()> {
    if tags.is_empty() {
        anyhow::bail!("변경할 필드를 하나 이상 지정하세요");
    }

    let mut call = MethodCall::new("writeAllTags").arg("path", path_arg(file));
    for (field, value) in tags.present() {
        call = call.arg(field.key(), value);
    }

    into_value(dispatcher.call(call))?;
    println!("태그가 업데이트되었습니다: {}", file.display());
    Ok(())
}

fn cmd_set_artwork(dispatcher: &Dispatcher, file: &Path, image: &Path) -> Result<()> {
    let call = MethodCall::new("writeArtwork")
        .arg("path", path_arg(file))
        .arg("artworkPath", path_arg(image));

    into_value(dispatcher.call(call))?;
    println!("아트워크가 기록되었습니다: {}", file.display());
    Ok(())
}

fn cmd_extract_artwork(dispatcher: &Dispatcher, file: &Path, output: Option<&Path>) -> Result<()> {
    let call = MethodCall::new("extractArtwork").arg("path", path_arg(file));
    let Some(Value::Bytes(bytes)) = into_value(dispatcher.call(call))? else {
        println!("아트워크가 없습니다: {}", file.display());
        return Ok(());
    };

    match output {
        Some(output) => {
            std::fs::write(output, &bytes)
                .with_context(|| format!("파일을 쓸 수 없습니다: {}", output.display()))?;
            println!("아트워크를 저장했습니다: {} ({} 바이트)", output.display(), bytes.len());
        }
        None => println!("아트워크 {} 바이트", bytes.len()),
    }
    Ok(())
}

fn cmd_bytes(dispatcher: &Dispatcher, call: MethodCall, output: &Path) -> Result<()> {
    let method = call.method.clone();
    let Some(Value::Bytes(bytes)) = into_value(dispatcher.call(call))? else {
        println!("{method}: 결과가 없습니다");
        return Ok(());
    };

    std::fs::write(output, &bytes)
        .with_context(|| format!("파일을 쓸 수 없습니다: {}", output.display()))?;
    println!("저장했습니다: {} ({} 바이트)", output.display(), bytes.len());
    Ok(())
}

/// `serve`의 요청 한 줄. `id`가 없으면 디스패처가 붙이되, 이미 쓰인 id는 피한다.
#[derive(Deserialize)]
struct Envelope {
    id: Option<u64>,
    #[serde(flatten)]
    call: MethodCall,
}

/// 아직 쓰이지 않은 카운터 값을 고른다.
fn fresh_id(submitter: &Submitter, used: &HashSet<RequestId>) -> RequestId {
    loop {
        let id = submitter.next_id();
        if !used.contains(&id) {
            return id;
        }
    }
}

fn read_requests(input: impl BufRead, submitter: Submitter) -> io::Result<()> {
    let mut used = HashSet::new();
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Envelope>(&line) {
            Ok(envelope) => {
                let id = envelope.id.unwrap_or_else(|| fresh_id(&submitter, &used));
                if !used.insert(id) {
                    tracing::warn!(id, "같은 id의 요청이 다시 들어왔습니다");
                }
                submitter.submit_as(id, envelope.call);
            }
            Err(e) => {
                tracing::warn!(error = %e, "요청을 해석할 수 없습니다");
                let id = fresh_id(&submitter, &used);
                used.insert(id);
                submitter.reject(id, Response::invalid_request(e.to_string()));
            }
        }
    }
    Ok(())
}

/// 입력은 별도 스레드에서 읽고, 응답은 이 스레드에서 완료되는 순서대로 쓴다.
fn serve(input: impl BufRead + Send + 'static, mut output: impl Write, dispatcher: Dispatcher) -> Result<()> {
    let submitter = dispatcher.submitter();
    let completions = dispatcher.into_completions();
    let reader = thread::spawn(move || read_requests(input, submitter));

    for completion in completions {
        let method = (!completion.method.is_empty()).then_some(completion.method.as_str());
        writeln!(output, "{}", completion.response.to_json(completion.id, method))?;
        output.flush()?;
    }

    reader
        .join()
        .map_err(|_| anyhow::anyhow!("입력 스레드가 비정상 종료되었습니다"))?
        .context("표준 입력을 읽을 수 없습니다")?;
    Ok(())
}

fn cmd_serve(dispatcher: Dispatcher) -> Result<()> {
    tracing::info!("serve 시작");
    serve(io::BufReader::new(io::stdin()), io::stdout().lock(), dispatcher)
}

fn cmd_config(mut cfg: Config, thumbnail_mode: Option<ThumbnailMode>) -> Result<()> {
    if let Some(mode) = thumbnail_mode {
        cfg.thumbnail.mode = mode;
        config::save_config(&cfg)?;
        println!("설정이 저장되었습니다: {}", config::config_path().display());
    }

    println!("# {}", config::config_path().display());
    print!("{}", toml::to_string_pretty(&cfg)?);
    println!(
        "# 렌더링 지원: {}",
        if thumbnail::can_render() { "예" } else { "아니오" }
    );
    Ok(())
}
