//! 带对话框的命令

use std::sync::Arc;

use anyhow::Context;
use tracing::debug;

use crate::bridge::ExecutionContext;
use crate::command::{Command, DispatchPolicy};
use crate::dialog::controller::DialogView;
use crate::dialog::progress::DialogModel;
use crate::utils::AppResult;

/// 执行期间显示一个对话框的命令
///
/// 视图和模型在对话框线程上通过关联函数创建，命令实例本身不会进入该线程。
pub trait DialogCommand: Send + 'static {
    type View: DialogView;
    type Model: DialogModel;

    fn create_view() -> Self::View;

    fn create_model(view: &Self::View) -> Arc<Self::Model>;

    /// 为 false 时执行结束后对话框保持打开，交由用户关闭
    fn close_view_when_finished(&self) -> bool {
        true
    }

    fn dispatch_policy(&self) -> DispatchPolicy {
        DispatchPolicy::Affine
    }

    fn pre_execute(&mut self, _ctx: &mut ExecutionContext) -> AppResult<()> {
        Ok(())
    }

    fn execute_main(&mut self, ctx: &mut ExecutionContext) -> AppResult<()>;

    fn post_execute(&mut self, _ctx: &mut ExecutionContext) -> AppResult<()> {
        Ok(())
    }
}

/// 把 `DialogCommand` 适配为普通 `Command`
///
/// 前置阶段打开对话框，后置阶段先关闭对话框再执行内部命令的后置逻辑；
/// 不要求关闭时先执行内部后置逻辑，再让对话框脱离执行。
pub struct WithDialog<C> {
    inner: C,
}

impl<C: DialogCommand> WithDialog<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: DialogCommand> Command for WithDialog<C> {
    fn dispatch_policy(&self) -> DispatchPolicy {
        self.inner.dispatch_policy()
    }

    fn pre_execute(&mut self, ctx: &mut ExecutionContext) -> AppResult<()> {
        let session = ctx
            .dialogs()
            .open(C::create_view, C::create_model)
            .context("打开对话框失败")?;
        ctx.attach_dialog(session)?;

        if let Err(err) = self.inner.pre_execute(ctx) {
            if let Some(session) = ctx.take_dialog() {
                ctx.dialogs().close(&session);
            }
            return Err(err);
        }
        Ok(())
    }

    fn execute_main(&mut self, ctx: &mut ExecutionContext) -> AppResult<()> {
        self.inner.execute_main(ctx)
    }

    fn post_execute(&mut self, ctx: &mut ExecutionContext) -> AppResult<()> {
        if !self.inner.close_view_when_finished() {
            let result = self.inner.post_execute(ctx);
            if let Some(session) = ctx.take_dialog() {
                let detached = session.detach();
                debug!("对话框 {} 在命令结束后保持打开", detached.id());
            }
            return result;
        }

        if let Some(session) = ctx.dialog() {
            let outcome = ctx.dialogs().close(session);
            debug!("对话框 {} 关闭结果: {:?}", session.id(), outcome);
        }
        self.inner.post_execute(ctx)
    }
}
