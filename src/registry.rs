//! 内存资源存储：助手、线程、运行记录和部署

use dashmap::DashMap;

use crate::routes::assistant::Assistant;
use crate::routes::deployment::Deployment;
use crate::routes::thread::{Message, Run, Thread};

pub struct Registry {
    assistants: DashMap<String, Assistant>,
    threads: DashMap<String, Thread>,
    runs: DashMap<String, Run>,
    deployments: DashMap<String, Deployment>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// 创建存储并预置默认助手
    pub fn new() -> Self {
        let registry = Self {
            assistants: DashMap::new(),
            threads: DashMap::new(),
            runs: DashMap::new(),
            deployments: DashMap::new(),
        };
        registry.insert_assistant(Assistant::default_assistant());
        registry
    }

    pub fn list_assistants(&self) -> Vec<Assistant> {
        let mut all: Vec<_> = self.assistants.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    pub fn insert_assistant(&self, assistant: Assistant) -> Assistant {
        self.assistants
            .insert(assistant.id.clone(), assistant.clone());
        assistant
    }

    pub fn assistant(&self, id: &str) -> Option<Assistant> {
        self.assistants.get(id).map(|a| a.value().clone())
    }

    pub fn insert_thread(&self, thread: Thread) -> Thread {
        self.threads.insert(thread.id.clone(), thread.clone());
        thread
    }

    pub fn thread(&self, id: &str) -> Option<Thread> {
        self.threads.get(id).map(|t| t.value().clone())
    }

    /// 追加消息，线程不存在时返回 None
    pub fn append_message(&self, thread_id: &str, mut message: Message) -> Option<Message> {
        let mut thread = self.threads.get_mut(thread_id)?;
        message.thread_id = thread_id.to_string();
        thread.messages.push(message.clone());
        Some(message)
    }

    pub fn messages(&self, thread_id: &str) -> Option<Vec<Message>> {
        self.threads.get(thread_id).map(|t| t.messages.clone())
    }

    pub fn insert_run(&self, run: Run) -> Run {
        self.runs.insert(run.id.clone(), run.clone());
        run
    }

    /// 只返回属于该线程的运行记录
    pub fn run(&self, thread_id: &str, run_id: &str) -> Option<Run> {
        self.runs
            .get(run_id)
            .filter(|run| run.thread_id == thread_id)
            .map(|run| run.value().clone())
    }

    pub fn list_deployments(&self) -> Vec<Deployment> {
        let mut all: Vec<_> = self.deployments.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    pub fn insert_deployment(&self, deployment: Deployment) -> Deployment {
        self.deployments
            .insert(deployment.id.clone(), deployment.clone());
        deployment
    }

    pub fn deployment(&self, id: &str) -> Option<Deployment> {
        self.deployments.get(id).map(|d| d.value().clone())
    }

    pub fn remove_deployment(&self, id: &str) -> bool {
        self.deployments.remove(id).is_some()
    }
}
