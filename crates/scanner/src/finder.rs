//! 프로젝트 탐색 -- `package.json`을 포함한 디렉토리 찾기
//!
//! [`ProjectFinder`]는 루트 디렉토리를 깊이 우선으로 순회하며
//! 프로젝트 매니페스트(`package.json`)가 있는 디렉토리를 수집합니다.
//!
//! - 형제 항목은 파일 이름 순으로 방문하므로 같은 트리에 대해 결과 순서가 항상 같습니다.
//! - `node_modules` 디렉토리는 들어가지도, 검사하지도 않습니다.
//! - 경로에 `node_modules` 구성 요소가 있는 디렉토리는 결과에 포함되지 않습니다.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::config::ScannerConfig;
use crate::error::ScannerError;

/// 프로젝트 매니페스트 파일 이름
pub const MANIFEST_FILE: &str = "package.json";

/// 의존성 캐시 디렉토리 이름
pub const DEPENDENCY_DIR: &str = "node_modules";

/// npm 프로젝트 탐색기
#[derive(Debug, Clone, Default)]
pub struct ProjectFinder {
    follow_symlinks: bool,
    max_depth: Option<usize>,
}

impl ProjectFinder {
    /// 기본 설정(심볼릭 링크 미추적, 깊이 무제한)으로 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 스캐너 설정에서 탐색 옵션을 가져옵니다.
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self {
            follow_symlinks: config.follow_symlinks,
            max_depth: config.max_depth,
        }
    }

    /// 심볼릭 링크 추적 여부를 설정합니다.
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// 최대 탐색 깊이를 설정합니다 (루트 = 0).
    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// 루트 아래의 모든 프로젝트 디렉토리를 찾습니다 (동기 I/O).
    ///
    /// 비동기 컨텍스트에서는 [`discover`](Self::discover)를 사용합니다.
    ///
    /// # Errors
    ///
    /// 루트가 없거나 디렉토리가 아니거나, 순회 중 읽을 수 없는 항목을 만나면
    /// `ScannerError::Discovery`를 반환합니다.
    pub fn find(&self, root: &Path) -> Result<Vec<PathBuf>, ScannerError> {
        let metadata = std::fs::metadata(root).map_err(|e| ScannerError::Discovery {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;
        if !metadata.is_dir() {
            return Err(ScannerError::Discovery {
                path: root.display().to_string(),
                reason: "not a directory".to_owned(),
            });
        }

        info!(root = %root.display(), "searching for npm projects");

        let mut walker = WalkDir::new(root)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name();
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        let mut projects = Vec::new();
        for entry in walker.into_iter().filter_entry(|e| !is_dependency_dir(e)) {
            let entry = entry.map_err(|e| ScannerError::Discovery {
                path: e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| root.display().to_string()),
                reason: e.to_string(),
            })?;

            if entry.file_type().is_dir() || entry.file_name() != OsStr::new(MANIFEST_FILE) {
                continue;
            }

            let Some(project_dir) = entry.path().parent() else {
                continue;
            };

            if has_dependency_component(project_dir) {
                debug!(path = %project_dir.display(), "skipping manifest inside node_modules");
                continue;
            }

            if projects.last().is_some_and(|last: &PathBuf| last == project_dir) {
                continue;
            }

            debug!(path = %project_dir.display(), "found npm project");
            projects.push(project_dir.to_path_buf());
        }

        info!(count = projects.len(), "project discovery completed");
        Ok(projects)
    }

    /// [`find`](Self::find)를 blocking 스레드에서 실행합니다.
    pub async fn discover(&self, root: &Path) -> Result<Vec<PathBuf>, ScannerError> {
        let finder = self.clone();
        let root_buf = root.to_path_buf();
        tokio::task::spawn_blocking(move || finder.find(&root_buf))
            .await
            .map_err(|e| ScannerError::Discovery {
                path: root.display().to_string(),
                reason: format!("spawn_blocking failed: {e}"),
            })?
    }
}

fn is_dependency_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name() == OsStr::new(DEPENDENCY_DIR)
}

/// 경로에 `node_modules` 구성 요소가 있는지 확인합니다.
pub fn has_dependency_component(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(name) if name == OsStr::new(DEPENDENCY_DIR)))
}
